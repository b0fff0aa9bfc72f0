/// Names of every file belonging to one generated run.
///
/// Indexed runs append `_<index>` to each name; the single-file layout
/// leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFiles<'a> {
    stem: &'a str,
    index: Option<usize>,
}

impl<'a> RunFiles<'a> {
    pub fn indexed(stem: &'a str, index: usize) -> RunFiles<'a> {
        RunFiles { stem, index: Some(index) }
    }

    pub fn single(stem: &'a str) -> RunFiles<'a> {
        RunFiles { stem, index: None }
    }

    // `<stem>_<purpose>[_<index>].<ext>`
    fn tagged(&self, purpose: &str, ext: &str) -> String {
        match self.index {
            Some(i) => format!("{}_{}_{}.{}", self.stem, purpose, i, ext),
            None => format!("{}_{}.{}", self.stem, purpose, ext),
        }
    }

    fn suffixed(&self) -> String {
        match self.index {
            Some(i) => format!("{}_{}", self.stem, i),
            None => self.stem.to_string(),
        }
    }

    pub fn script(&self) -> String {
        format!("lammps_{}.in", self.suffixed())
    }

    pub fn poly_input(&self) -> String {
        self.tagged("poly_input", "data")
    }

    pub fn thermo_output(&self) -> String {
        self.tagged("thermo_output", "dat")
    }

    pub fn msd_ficoll(&self) -> String {
        self.tagged("msd_ficoll", "dat")
    }

    pub fn com_poly(&self) -> String {
        self.tagged("com_poly", "dat")
    }

    pub fn msd_polymer(&self) -> String {
        self.tagged("msd_polymer", "dat")
    }

    pub fn snapshot(&self) -> String {
        format!("simulation.{}_snap", self.suffixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_names() {
        let files = RunFiles::indexed("rho_0_004", 3);
        assert_eq!(files.script(), "lammps_rho_0_004_3.in");
        assert_eq!(files.poly_input(), "rho_0_004_poly_input_3.data");
        assert_eq!(files.thermo_output(), "rho_0_004_thermo_output_3.dat");
        assert_eq!(files.msd_ficoll(), "rho_0_004_msd_ficoll_3.dat");
        assert_eq!(files.com_poly(), "rho_0_004_com_poly_3.dat");
        assert_eq!(files.msd_polymer(), "rho_0_004_msd_polymer_3.dat");
        assert_eq!(files.snapshot(), "simulation.rho_0_004_3_snap");
    }

    #[test]
    fn single_names_drop_the_index() {
        let files = RunFiles::single("melt");
        assert_eq!(files.script(), "lammps_melt.in");
        assert_eq!(files.poly_input(), "melt_poly_input.data");
        assert_eq!(files.msd_polymer(), "melt_msd_polymer.dat");
        assert_eq!(files.snapshot(), "simulation.melt_snap");
    }
}
