//! System parameters and their conversion to reduced units.
//!
//! The polymer segment sets the length, mass and energy scales: `sigma0`
//! (nm), `mass0` (g/mol) and `eps0`. The solute is a rigid sphere of fixed
//! physical diameter (9 nm) and mass (70 kDa) expressed in those units.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::PrepError;

/// Converts a mass density in g/cm^3 to g/mol per nm^3 (1/0.6022).
pub const DENSITY_CONVERSION: f64 = 1.66;
/// Solute diameter in nm.
pub const SOLUTE_DIAMETER: f64 = 9.0;
/// Solute molar mass in g/mol.
pub const SOLUTE_MASS: f64 = 70_000.0;

pub const TEMPERATURE: f64 = 1.0;
pub const GAMMA: f64 = 1.0;
pub const TIME_STEP: f64 = 0.001;

/// Which species the simulated system contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Polymer chains mixed with rigid solute spheres.
    Mixed,
    /// Polymer chains alone.
    PolymerOnly,
}

/// User-facing description of one system. Loaded from a TOML file with
/// `confy`; fields missing from the file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParameters {
    pub sigma0: f64,
    pub mass0: f64,
    pub eps0: f64,
    pub rho_real: f64,
    pub phi_hs: f64,
    pub nchain: u32,
    pub nmonomers: u32,
    pub filename: String,
    pub number_of_steps: u64,
    pub number_of_steps_equilibration: u64,
    pub soft_equilibration_steps: u64,
    pub low_attraction: f64,
    pub num_files: usize,
    pub type_simulation: bool,
    pub single_file: bool,
}

impl Default for SystemParameters {
    fn default() -> Self {
        SystemParameters {
            sigma0: 0.626,
            mass0: 44.0,
            eps0: 1.0,
            rho_real: 0.004,
            phi_hs: 0.05,
            nchain: 10,
            nmonomers: 168,
            filename: String::from("rho_0_004_phi_hs_0_05"),
            number_of_steps: 10_000_000,
            number_of_steps_equilibration: 2_000_000,
            soft_equilibration_steps: 100_000,
            low_attraction: 0.5,
            num_files: 1,
            type_simulation: true,
            single_file: false,
        }
    }
}

/// Lennard-Jones coefficients for one pair of species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCoeff {
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: f64,
}

impl PairCoeff {
    // purely repulsive (WCA) cutoff at the potential minimum
    fn repulsive(epsilon: f64, sigma: f64) -> PairCoeff {
        PairCoeff {
            epsilon,
            sigma,
            cutoff: 2f64.powf(1. / 6.) * sigma,
        }
    }
}

/// Reduced-unit quantities consumed by the chain tool and the LAMMPS script.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedParameters {
    /// Mass density in g/mol per nm^3.
    pub rho_molar: f64,
    pub rho_star: f64,
    pub aa: PairCoeff,
    pub ab: PairCoeff,
    pub bb: PairCoeff,
    pub mass_a: f64,
    pub mass_b: f64,
    pub volume: f64,
    pub box_side: f64,
    pub n_hs: u64,
    pub npart_tot: u64,
    pub temperature: f64,
    pub gamma: f64,
    pub time_step: f64,
}

impl SystemParameters {
    pub fn variant(&self) -> Variant {
        if self.type_simulation {
            Variant::Mixed
        } else {
            Variant::PolymerOnly
        }
    }

    pub fn monomer_count(&self) -> u64 {
        u64::from(self.nchain) * u64::from(self.nmonomers)
    }

    /// Check every field before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), PrepError> {
        positive("sigma0", self.sigma0)?;
        positive("mass0", self.mass0)?;
        positive("eps0", self.eps0)?;
        positive("rho_real", self.rho_real)?;
        if !self.phi_hs.is_finite() || self.phi_hs < 0.0 || self.phi_hs >= 1.0 {
            return Err(PrepError::invalid(
                "phi_hs",
                format!("packing fraction must lie in [0, 1), got {}", self.phi_hs),
            ));
        }
        if !self.low_attraction.is_finite() || self.low_attraction < 0.0 {
            return Err(PrepError::invalid(
                "low_attraction",
                format!("must be a finite non-negative energy, got {}", self.low_attraction),
            ));
        }
        nonzero("nchain", u64::from(self.nchain))?;
        nonzero("nmonomers", u64::from(self.nmonomers))?;
        nonzero("number_of_steps", self.number_of_steps)?;
        nonzero("number_of_steps_equilibration", self.number_of_steps_equilibration)?;
        nonzero("soft_equilibration_steps", self.soft_equilibration_steps)?;
        nonzero("num_files", self.num_files as u64)?;
        if self.single_file && self.num_files != 1 {
            return Err(PrepError::invalid(
                "num_files",
                format!("single_file output needs exactly one file, got {}", self.num_files),
            ));
        }

        // spliced unquoted into LAMMPS directives and file names
        if self.filename.is_empty() {
            return Err(PrepError::invalid("filename", "must not be empty"));
        }
        if let Some(c) = self
            .filename
            .chars()
            .find(|c| c.is_whitespace() || *c == '/' || *c == '\\')
        {
            return Err(PrepError::invalid(
                "filename",
                format!("{:?} contains forbidden character {:?}", self.filename, c),
            ));
        }
        Ok(())
    }

    /// Convert to reduced units.
    ///
    /// `rho_star`, `volume`, `box_side` and `n_hs` each depend on the one
    /// before it and are computed in that order.
    pub fn derive(&self) -> Result<DerivedParameters, PrepError> {
        self.validate()?;

        let rho_molar = self.rho_real / DENSITY_CONVERSION;
        let rho_star = rho_molar * self.sigma0.powf(3.) / self.mass0;
        finite_positive("rho_star", rho_star)?;

        let aa = PairCoeff::repulsive(1.0, 1.0);
        let bb = PairCoeff::repulsive(1.0, SOLUTE_DIAMETER / self.sigma0);
        let ab = PairCoeff::repulsive(1.0, (aa.sigma + bb.sigma) / 2.0);

        let monomers = self.monomer_count();
        let volume = monomers as f64 / rho_star;
        finite_positive("volume", volume)?;
        let box_side = volume.powf(1. / 3.);
        finite_positive("box_side", box_side)?;

        let n_hs = (6. * volume * self.phi_hs / (PI * bb.sigma.powf(3.))).floor();
        if !n_hs.is_finite() || n_hs > u64::MAX as f64 {
            return Err(PrepError::invalid(
                "phi_hs",
                format!("solute count {} is not representable", n_hs),
            ));
        }
        let n_hs = n_hs as u64;

        Ok(DerivedParameters {
            rho_molar,
            rho_star,
            aa,
            ab,
            bb,
            mass_a: 1.0,
            mass_b: SOLUTE_MASS / self.mass0,
            volume,
            box_side,
            n_hs,
            npart_tot: monomers + n_hs,
            temperature: TEMPERATURE,
            gamma: GAMMA,
            time_step: TIME_STEP,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), PrepError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PrepError::invalid(
            field,
            format!("must be a finite positive number, got {}", value),
        ))
    }
}

fn nonzero(field: &'static str, value: u64) -> Result<(), PrepError> {
    if value == 0 {
        Err(PrepError::invalid(field, "must be at least 1"))
    } else {
        Ok(())
    }
}

fn finite_positive(field: &'static str, value: f64) -> Result<(), PrepError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PrepError::invalid(
            field,
            format!("derived value {} is not finite and positive", value),
        ))
    }
}
