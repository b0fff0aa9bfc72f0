use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::chain::{self, ChainInput, CHAIN_INPUT_FILE};
use crate::error::PrepError;
use crate::naming::RunFiles;
use crate::params::{DerivedParameters, SystemParameters};
use crate::script::{LammpsScript, ScriptSeeds};
use crate::seed::SeedSource;
use crate::tool::{ToolCommand, ToolRunner};

/// Where the generator finds its tools and puts its output.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Directory holding `lib/chain.f` and `lib/chain_alone.f`.
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub compiler: String,
    pub timeout: Duration,
}

impl GeneratorSettings {
    pub fn new(root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        GeneratorSettings {
            root: root.into(),
            out_dir: out_dir.into(),
            compiler: String::from("gfortran"),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Files written by a completed run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub derived: DerivedParameters,
    pub data_files: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
}

/// One generation pass: compile the chain tool, grow the chains for every
/// file index, then write the matching LAMMPS scripts.
pub struct Generator<R: ToolRunner> {
    params: SystemParameters,
    derived: DerivedParameters,
    settings: GeneratorSettings,
    runner: R,
    seeds: SeedSource,
}

impl<R: ToolRunner> Generator<R> {
    /// Validate and convert `params`. Nothing is written yet.
    pub fn new(
        params: SystemParameters,
        settings: GeneratorSettings,
        runner: R,
        seeds: SeedSource,
    ) -> Result<Generator<R>, PrepError> {
        let derived = params.derive()?;
        Ok(Generator {
            params,
            derived,
            settings,
            runner,
            seeds,
        })
    }

    pub fn run(&mut self) -> Result<GenerationReport, PrepError> {
        // the chain tool runs inside the output directory, so every path
        // handed to it must be absolute
        let out_dir = self.settings.out_dir.clone();
        fs::create_dir_all(&out_dir).map_err(|e| PrepError::io(&out_dir, e))?;
        self.settings.out_dir = fs::canonicalize(&out_dir).map_err(|e| PrepError::io(&out_dir, e))?;

        info!(
            "rho* = {:.6e}, box side = {:.3}, {} monomers + {} solute particles",
            self.derived.rho_star,
            self.derived.box_side,
            self.params.monomer_count(),
            self.derived.n_hs
        );

        let binary = self.compile()?;

        let mut data_files = Vec::with_capacity(self.params.num_files);
        for index in 0..self.params.num_files {
            data_files.push(self.generate_chains(&binary, index)?);
        }

        let mut scripts = Vec::with_capacity(self.params.num_files);
        for index in 0..self.params.num_files {
            scripts.push(self.emit_script(index)?);
        }

        Ok(GenerationReport {
            derived: self.derived.clone(),
            data_files,
            scripts,
        })
    }

    /// Store the effective parameters next to the generated files.
    pub fn save_parameters(&self) -> Result<PathBuf, PrepError> {
        let out_dir = &self.settings.out_dir;
        fs::create_dir_all(out_dir).map_err(|e| PrepError::io(out_dir, e))?;
        let path = out_dir.join(format!("{}_params.toml", self.params.filename));
        confy::store_path(&path, &self.params).map_err(|e| {
            PrepError::io(&path, std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;
        Ok(path)
    }

    fn files(&self, index: usize) -> RunFiles<'_> {
        if self.params.single_file {
            RunFiles::single(&self.params.filename)
        } else {
            RunFiles::indexed(&self.params.filename, index)
        }
    }

    fn compile(&mut self) -> Result<PathBuf, PrepError> {
        let source = chain::source_path(&self.settings.root, self.params.variant());
        if !source.is_file() {
            return Err(PrepError::io(
                &source,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "chain generator source not found",
                ),
            ));
        }
        let binary = self
            .settings
            .out_dir
            .join(format!("chain{}", std::env::consts::EXE_SUFFIX));

        info!("compiling {}", source.display());
        let step = "compiling chain generator";
        let cmd = ToolCommand::new(step, &self.settings.compiler, self.settings.timeout)
            .arg(source.as_os_str())
            .arg("-o")
            .arg(binary.as_os_str());
        self.runner.run(&cmd)?.check(step)?;
        Ok(binary)
    }

    fn generate_chains(&mut self, binary: &Path, index: usize) -> Result<PathBuf, PrepError> {
        let out_dir = &self.settings.out_dir;
        let input = ChainInput::new(&self.params, &self.derived, &mut self.seeds);
        let input_path = out_dir.join(CHAIN_INPUT_FILE);
        write_file(&input_path, |w| input.write_to(w))?;
        debug!("chain seed for file {}: {}", index, input.seed);

        let step = format!("chain generation (file {})", index);
        let cmd = ToolCommand::new(step.as_str(), binary, self.settings.timeout)
            .stdin(&input_path)
            .working_dir(out_dir);
        let output = self.runner.run(&cmd)?.check(&step)?;
        let data = chain::clean_output(&step, output.stdout)?;

        let data_path = out_dir.join(self.files(index).poly_input());
        write_file(&data_path, |w| w.write_all(data.as_bytes()))?;
        info!("wrote {}", data_path.display());
        Ok(data_path)
    }

    fn emit_script(&mut self, index: usize) -> Result<PathBuf, PrepError> {
        let seeds = ScriptSeeds::draw(&mut self.seeds);
        let files = self.files(index);
        let script = LammpsScript::new(&self.params, &self.derived, files, seeds);
        let path = self.settings.out_dir.join(files.script());
        write_file(&path, |w| script.write_to(w))?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

fn write_file<F>(path: &Path, body: F) -> Result<(), PrepError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| PrepError::io(path, e))
}
