//! LAMMPS input script for one generated run.
//!
//! The script reads the chain data file, relaxes the overlapping random-walk
//! chains with a ramped soft potential, switches to the production pair
//! potentials, minimizes, equilibrates and finally runs with the diagnostic
//! fixes attached.

use std::io::{self, Write};

use crate::naming::RunFiles;
use crate::params::{DerivedParameters, PairCoeff, SystemParameters, Variant};
use crate::real;
use crate::seed::SeedSource;

/// Final prefactor of the soft-potential ramp.
const SOFT_RAMP_CEILING: u32 = 60;
const NEIGHBOR_SKIN: f64 = 4.0;
const THERMO_EVERY: u32 = 1000;
const DUMP_EVERY: u32 = 10_000;
/// Range and cutoff of the attractive monomer-monomer term in polymer-only
/// runs.
const ATTRACTION_SIGMA: f64 = 1.0;
const ATTRACTION_CUTOFF: f64 = 2.5;

/// Random seeds written into one script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSeeds {
    pub velocity: u32,
    pub soft_thermostat: u32,
    pub insertion: u32,
    pub thermostat: u32,
}

impl ScriptSeeds {
    pub fn draw(seeds: &mut SeedSource) -> ScriptSeeds {
        ScriptSeeds {
            velocity: seeds.next_seed(),
            soft_thermostat: seeds.next_seed(),
            insertion: seeds.next_seed(),
            thermostat: seeds.next_seed(),
        }
    }
}

pub struct LammpsScript<'a> {
    params: &'a SystemParameters,
    derived: &'a DerivedParameters,
    files: RunFiles<'a>,
    seeds: ScriptSeeds,
}

impl<'a> LammpsScript<'a> {
    pub fn new(
        params: &'a SystemParameters,
        derived: &'a DerivedParameters,
        files: RunFiles<'a>,
        seeds: ScriptSeeds,
    ) -> LammpsScript<'a> {
        LammpsScript {
            params,
            derived,
            files,
            seeds,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let variant = self.params.variant();
        self.write_setup(out)?;
        match variant {
            Variant::Mixed => self.write_mixed_species(out)?,
            Variant::PolymerOnly => self.write_polymer_species(out)?,
        }
        self.write_soft_equilibration(out)?;
        match variant {
            Variant::Mixed => self.write_mixed_pairs(out)?,
            Variant::PolymerOnly => self.write_polymer_pairs(out)?,
        }
        self.write_relaxation(out)?;
        self.write_diagnostics(out, variant)?;
        writeln!(out, "run {}", self.params.number_of_steps)
    }

    fn write_setup<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "###################\n")?;
        writeln!(out, "# LAMMPS script generated by md-polymer\n")?;
        writeln!(out, "dimension 3")?;
        writeln!(out, "atom_style  molecular")?;
        writeln!(out, "boundary   p p p\n")?;
        writeln!(out, "neighbor {} multi", real(NEIGHBOR_SKIN))?;
        writeln!(out, "neigh_modify every 2 delay 10 check yes\n")?;
        writeln!(out, "read_data {}\n", self.files.poly_input())
    }

    fn write_mixed_species<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let h = real(self.derived.box_side / 2.);
        writeln!(out, "region box block -{0} {0} -{0} {0} -{0} {0}", h)?;
        writeln!(
            out,
            "create_atoms 2 random {} {} box\n",
            self.derived.n_hs, self.seeds.insertion
        )?;
        writeln!(out, "mass 1 {}", real(self.derived.mass_a))?;
        writeln!(out, "mass 2 {}\n", real(self.derived.mass_b))?;
        writeln!(out, "group polymer type 1")?;
        writeln!(out, "group HS type 2\n")
    }

    fn write_polymer_species<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "mass 1 {}", real(self.derived.mass_a))?;
        writeln!(out, "group polymer type 1")
    }

    // push overlapping monomers apart before the hard potentials go on
    fn write_soft_equilibration<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let t = real(self.derived.temperature);
        writeln!(out, "#########################")?;
        writeln!(out, "### POLYMER EQUILIBRATION")?;
        writeln!(out, "pair_style soft 1.0")?;
        writeln!(out, "pair_coeff * *  0.0  1.0")?;
        writeln!(out, "variable prefactor equal ramp(0,{})", SOFT_RAMP_CEILING)?;
        writeln!(out, "fix        1   all adapt 1 pair    soft a * * v_prefactor")?;
        write_fene(out)?;
        writeln!(out, "reset_timestep 0")?;
        writeln!(out, "timestep   {}", real(self.derived.time_step))?;
        writeln!(
            out,
            "velocity all create {} {}   rot yes dist gaussian",
            t, self.seeds.velocity
        )?;
        writeln!(out, "fix equilibrate1 all nve")?;
        writeln!(
            out,
            "fix equilibrate2 all langevin {0} {0} {1} {2}",
            t,
            real(self.derived.gamma),
            self.seeds.soft_thermostat
        )?;
        writeln!(out, "thermo_style  custom step temp pe ke etotal press")?;
        writeln!(out, "thermo {}", THERMO_EVERY)?;
        writeln!(out, "run {}", self.params.soft_equilibration_steps)?;
        writeln!(out, "unfix 1")?;
        writeln!(out, "unfix equilibrate1")?;
        writeln!(out, "unfix equilibrate2")?;
        writeln!(out, "# end of soft equilibration")?;
        writeln!(out, "#########################################")
    }

    fn write_mixed_pairs<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let d = self.derived;
        writeln!(
            out,
            "pair_style hybrid/overlay lj/cut {}  lj/cut {}  lj/cut {}\n",
            real(d.aa.cutoff),
            real(d.ab.cutoff),
            real(d.bb.cutoff)
        )?;
        write_shifted_lj(out, "1 1", 1, &d.aa)?;
        write_shifted_lj(out, "1 2", 2, &d.ab)?;
        write_shifted_lj(out, "2 2", 3, &d.bb)
    }

    fn write_polymer_pairs<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let d = self.derived;
        writeln!(
            out,
            "pair_style hybrid/overlay lj/cut {} lj/cut {}\n",
            real(d.aa.cutoff),
            real(ATTRACTION_CUTOFF)
        )?;
        write_shifted_lj(out, "1 1", 1, &d.aa)?;
        writeln!(
            out,
            "pair_coeff      1 1 lj/cut 2 {} {} {}\n",
            real(self.params.low_attraction),
            real(ATTRACTION_SIGMA),
            real(ATTRACTION_CUTOFF)
        )
    }

    fn write_relaxation<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let d = self.derived;
        let t = real(d.temperature);
        write_fene(out)?;
        writeln!(out)?;
        writeln!(out, "minimize              0.00000001 0.000000001 10000 100000")?;
        writeln!(out, "reset_timestep 0")?;
        writeln!(out, "timestep {}", real(d.time_step))?;
        writeln!(out, "fix integrator all nve")?;
        writeln!(
            out,
            "fix dynamics all langevin {0} {0} {1} {2}",
            t,
            real(d.gamma),
            self.seeds.thermostat
        )?;
        writeln!(out, "thermo_style  custom step temp pe ke etotal press")?;
        writeln!(out, "thermo {}", THERMO_EVERY)?;
        writeln!(out, "run {}", self.params.number_of_steps_equilibration)?;
        writeln!(out, "reset_timestep 0")
    }

    fn write_diagnostics<W: Write>(&self, out: &mut W, variant: Variant) -> io::Result<()> {
        let files = &self.files;
        writeln!(
            out,
            "dump img all custom {} {} id type xs ys zs vx vy vz",
            DUMP_EVERY,
            files.snapshot()
        )?;

        // radius of gyration per chain, reported in nm
        writeln!(out, "compute  cmol all chunk/atom molecule")?;
        writeln!(out, "compute gyr all gyration/chunk cmol")?;
        writeln!(out, "variable  ave equal ave(c_gyr)*{}", real(self.params.sigma0))?;
        writeln!(out, "variable KineticEnergy equal ke")?;
        writeln!(out, "variable PotentialEnergy equal pe")?;
        writeln!(out, "variable Temperature equal temp")?;
        writeln!(
            out,
            "fix             output all ave/time 20 50 1000 v_Temperature v_KineticEnergy v_PotentialEnergy v_ave file {} format %.15g\n",
            files.thermo_output()
        )?;
        writeln!(out, "thermo_style  custom step temp etotal press v_ave")?;
        writeln!(out, "thermo {}", THERMO_EVERY)?;

        if variant == Variant::Mixed {
            writeln!(out, "compute ficoll_msd HS msd")?;
            writeln!(
                out,
                "fix ficoll_msd HS ave/time 2 6 100 c_ficoll_msd[4] file {}",
                files.msd_ficoll()
            )?;
        }

        writeln!(out, "compute cc1 all chunk/atom molecule")?;
        writeln!(out, "compute myChunk all com/chunk cc1")?;
        writeln!(
            out,
            "fix myCOM all ave/time 100 1 100 c_myChunk[*] file {} mode vector",
            files.com_poly()
        )?;
        writeln!(out, "compute polymer_msd polymer chunk/atom molecule")?;
        writeln!(out, "compute chainMSD polymer msd/chunk polymer_msd")?;
        writeln!(
            out,
            "fix polymer_MSDPrint polymer ave/time 1000 1 1000 c_chainMSD[4] file {} mode vector",
            files.msd_polymer()
        )
    }
}

fn write_fene<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "bond_style     fene")?;
    writeln!(out, "bond_coeff 1   30.0    1.5 1.0 1.0")?;
    writeln!(out, "special_bonds fene")
}

fn write_shifted_lj<W: Write>(
    out: &mut W,
    types: &str,
    substyle: u32,
    coeff: &PairCoeff,
) -> io::Result<()> {
    writeln!(
        out,
        "pair_coeff      {} lj/cut {} {} {} {}",
        types,
        substyle,
        real(coeff.epsilon),
        real(coeff.sigma),
        real(coeff.cutoff)
    )?;
    writeln!(out, "pair_modify  shift yes\n")
}
