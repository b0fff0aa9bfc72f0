//! Input and output handling for the external chain generator.
//!
//! The generator is a small Fortran program that reads a parameter file on
//! standard input and prints a LAMMPS data file with randomly grown
//! bead-spring chains on standard output.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{PrepError, ToolFailure};
use crate::params::{DerivedParameters, SystemParameters, Variant};
use crate::real;
use crate::seed::SeedSource;

/// File the parameter block is written to before each chain run.
pub const CHAIN_INPUT_FILE: &str = "def.chain2";

/// Output lines dropped before the data file is handed to LAMMPS: the
/// `Masses` header and the type-1 mass entry the chain tool prints. Masses
/// are set in the generated script instead. Pinned to the layout of
/// `lib/chain.f` and `lib/chain_alone.f`.
pub const BOILERPLATE_LINES: [usize; 2] = [18, 20];

const MASSES_HEADER: &str = "Masses";

const CHAIN_SETS: u32 = 1;
const TAG_RULE: u32 = 0;
const MONOMER_TYPE: u32 = 1;
const BOND_TYPE: u32 = 1;
const BOND_LENGTH: f64 = 0.97;
const MIN_SKIP_DISTANCE: f64 = 1.02;

/// Fortran source of the chain generator for a given variant, relative to
/// the library root.
pub fn source_path(root: &Path, variant: Variant) -> PathBuf {
    let name = match variant {
        Variant::Mixed => "chain.f",
        Variant::PolymerOnly => "chain_alone.f",
    };
    root.join("lib").join(name)
}

/// One `def.chain2` parameter block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainInput {
    pub rho_star: f64,
    pub seed: u32,
    pub nchain: u32,
    pub nmonomers: u32,
}

impl ChainInput {
    pub fn new(
        params: &SystemParameters,
        derived: &DerivedParameters,
        seeds: &mut SeedSource,
    ) -> ChainInput {
        ChainInput {
            rho_star: derived.rho_star,
            seed: seeds.next_seed(),
            nchain: params.nchain,
            nmonomers: params.nmonomers,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Polymer chain definition\n")?;
        writeln!(out, "{}     rhostar", real(self.rho_star))?;
        writeln!(out, "{}     random # seed (8 digits or less)", self.seed)?;
        writeln!(
            out,
            "{}     # of sets of chains (blank line + 6 values for each set)",
            CHAIN_SETS
        )?;
        writeln!(
            out,
            "{}     molecule tag rule: 0 = by mol, 1 = from 1 end, 2 = from 2 ends\n",
            TAG_RULE
        )?;
        writeln!(out, "{}     number of chains", self.nchain)?;
        writeln!(out, "{}     monomers/chain", self.nmonomers)?;
        writeln!(
            out,
            "{}     type of monomers (for output into LAMMPS file)",
            MONOMER_TYPE
        )?;
        writeln!(
            out,
            "{}     type of bonds (for output into LAMMPS file)",
            BOND_TYPE
        )?;
        writeln!(
            out,
            "{}     distance between monomers (in reduced units)",
            real(BOND_LENGTH)
        )?;
        writeln!(
            out,
            "{}     no distance less than this from site i-1 to i+1 (reduced unit)",
            real(MIN_SKIP_DISTANCE)
        )?;
        Ok(())
    }
}

/// Drop [`BOILERPLATE_LINES`] from raw chain tool output, keeping every
/// other line byte for byte.
pub fn strip_boilerplate(raw: &str) -> Result<String, ToolFailure> {
    let lines: Vec<&str> = raw.split_inclusive('\n').collect();
    let needed = BOILERPLATE_LINES[1] + 1;
    if lines.len() < needed {
        return Err(ToolFailure::MalformedOutput(format!(
            "expected at least {} lines of chain data, got {}",
            needed,
            lines.len()
        )));
    }

    let header = lines[BOILERPLATE_LINES[0]].trim();
    if header != MASSES_HEADER {
        warn!(
            "chain output line {} is {:?}, expected {:?}; the tool's output layout may have changed",
            BOILERPLATE_LINES[0], header, MASSES_HEADER
        );
    }

    Ok(lines
        .iter()
        .enumerate()
        .filter(|(pos, _)| !BOILERPLATE_LINES.contains(pos))
        .map(|(_, line)| *line)
        .collect())
}

/// Decode captured chain tool output and strip it, naming the run on error.
pub fn clean_output(step: &str, stdout: Vec<u8>) -> Result<String, PrepError> {
    let raw = String::from_utf8(stdout).map_err(|e| {
        PrepError::tool(
            step,
            ToolFailure::MalformedOutput(format!("output is not UTF-8: {}", e)),
        )
    })?;
    strip_boilerplate(&raw).map_err(|failure| PrepError::tool(step, failure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &ChainInput) -> String {
        let mut buf = Vec::new();
        input.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample_input() -> ChainInput {
        ChainInput {
            rho_star: 1.3434522234392116e-05,
            seed: 12345678,
            nchain: 10,
            nmonomers: 168,
        }
    }

    #[test]
    fn parameter_block_layout() {
        let text = render(&sample_input());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[1], "");
        assert_eq!(lines[6], "");

        let fields: Vec<&str> = lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec![
                "Polymer",
                "1.3434522234392116e-5",
                "12345678",
                "1",
                "0",
                "10",
                "168",
                "1",
                "1",
                "0.97",
                "1.02",
            ]
        );
        assert!(lines[2].ends_with("rhostar"));
        assert!(lines[3].ends_with("random # seed (8 digits or less)"));
        assert!(lines[12].ends_with("from site i-1 to i+1 (reduced unit)"));
    }

    #[test]
    fn seed_is_drawn_from_the_source() {
        let params = SystemParameters::default();
        let derived = params.derive().unwrap();
        let mut seeds = SeedSource::seeded(1);
        let a = ChainInput::new(&params, &derived, &mut seeds);
        let b = ChainInput::new(&params, &derived, &mut seeds);
        assert!(a.seed >= 10_000 && a.seed < 100_000_000);
        assert_ne!(a.seed, b.seed);
        assert_eq!(a.rho_star, derived.rho_star);
    }

    #[test]
    fn short_output_is_rejected() {
        let raw = "line\n".repeat(20);
        match strip_boilerplate(&raw) {
            Err(ToolFailure::MalformedOutput(msg)) => assert!(msg.contains("got 20")),
            other => panic!("expected malformed output, got {:?}", other),
        }
    }

    #[test]
    fn exactly_two_lines_are_removed() {
        let raw: String = (0..25).map(|i| format!("l{}\n", i)).collect();
        let stripped = strip_boilerplate(&raw).unwrap();
        let kept: Vec<&str> = stripped.lines().collect();
        assert_eq!(kept.len(), 23);
        assert!(!kept.contains(&"l18"));
        assert!(!kept.contains(&"l20"));
        assert!(kept.contains(&"l19"));
        assert!(kept.contains(&"l21"));
    }

    #[test]
    fn invalid_utf8_is_a_tool_error() {
        match clean_output("chain generation", vec![0xff, 0xfe, b'\n']) {
            Err(PrepError::Tool { step, failure: ToolFailure::MalformedOutput(_) }) => {
                assert_eq!(step, "chain generation")
            }
            other => panic!("expected malformed output, got {:?}", other),
        }
    }

    #[test]
    fn source_follows_variant() {
        let root = Path::new("/opt/polymer");
        assert_eq!(
            source_path(root, Variant::Mixed),
            Path::new("/opt/polymer/lib/chain.f")
        );
        assert_eq!(
            source_path(root, Variant::PolymerOnly),
            Path::new("/opt/polymer/lib/chain_alone.f")
        );
    }
}
