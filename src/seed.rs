use rand::prelude::*;
use rand_distr::Uniform;
use rand_pcg::Pcg64;

/// Smallest seed handed to the chain tool or to LAMMPS.
pub const SEED_MIN: u32 = 10_000;
/// Exclusive upper bound; the chain tool reads at most 8 digits.
pub const SEED_MAX: u32 = 100_000_000;

/// Source of the random seeds written into generated files.
///
/// Every seed in a run comes from here, so a run started from
/// [`SeedSource::seeded`] writes the same files every time.
pub struct SeedSource {
    rng: Pcg64,
    range: Uniform<u32>,
}

impl SeedSource {
    pub fn seeded(seed: u64) -> SeedSource {
        SeedSource::with_rng(Pcg64::seed_from_u64(seed))
    }

    pub fn from_entropy() -> SeedSource {
        SeedSource::with_rng(Pcg64::from_entropy())
    }

    fn with_rng(rng: Pcg64) -> SeedSource {
        SeedSource {
            rng,
            range: Uniform::new(SEED_MIN, SEED_MAX),
        }
    }

    pub fn next_seed(&mut self) -> u32 {
        self.range.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_stay_in_range() {
        let mut seeds = SeedSource::seeded(7);
        for _ in 0..10_000 {
            let s = seeds.next_seed();
            assert!(s >= SEED_MIN && s < SEED_MAX, "seed {} out of range", s);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeedSource::seeded(42);
        let mut b = SeedSource::seeded(42);
        let xs: Vec<u32> = (0..16).map(|_| a.next_seed()).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.next_seed()).collect();
        assert_eq!(xs, ys);

        let mut c = SeedSource::seeded(43);
        let zs: Vec<u32> = (0..16).map(|_| c.next_seed()).collect();
        assert_ne!(xs, zs);
    }
}
