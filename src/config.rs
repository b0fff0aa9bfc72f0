use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PrepError;
use crate::generator::GeneratorSettings;
use crate::params::SystemParameters;
use crate::seed::SeedSource;

pub struct Config {
    pub root: PathBuf,
    pub params: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub seed: Option<u64>,
    pub compiler: String,
    pub timeout: Duration,
    pub save_params: bool,
}

impl Config {
    // initialize configuration from command line arguments
    pub fn new() -> Result<Config, PrepError> {
        Config::from_matches(&app().get_matches())
    }

    pub fn from_args<I, T>(args: I) -> Result<Config, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = app().get_matches_from_safe(args)?;
        Config::from_matches(&matches).map_err(|e| clap::Error::with_description(
            &e.to_string(),
            clap::ErrorKind::InvalidValue,
        ))
    }

    fn from_matches(matches: &ArgMatches) -> Result<Config, PrepError> {
        let root = PathBuf::from(matches.value_of_os("ROOT").unwrap_or_default());
        let params = matches.value_of_os("PARAMS").map(PathBuf::from);
        let out_dir = PathBuf::from(matches.value_of_os("OUT").unwrap_or_default());
        let seed = match matches.value_of("SEED") {
            Some(_) => Some(conv_match::<u64>(matches, "SEED")?),
            None => None,
        };
        let compiler = matches.value_of("FC").unwrap_or("gfortran").to_string();
        let timeout = conv_match::<f64>(matches, "TIMEOUT")?;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(PrepError::invalid("timeout", "must be a positive number of seconds"));
        }
        let save_params = matches.is_present("SAVE");

        Ok(Config {
            root,
            params,
            out_dir,
            seed,
            compiler,
            timeout: Duration::from_secs_f64(timeout),
            save_params,
        })
    }

    /// Parameters from the `--params` file, or the built-in default system.
    /// A missing file is created holding the defaults.
    pub fn load_parameters(&self) -> Result<SystemParameters, PrepError> {
        match &self.params {
            Some(path) => confy::load_path(path).map_err(|e| {
                PrepError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }),
            None => Ok(SystemParameters::default()),
        }
    }

    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            root: self.root.clone(),
            out_dir: self.out_dir.clone(),
            compiler: self.compiler.clone(),
            timeout: self.timeout,
        }
    }

    pub fn seed_source(&self) -> SeedSource {
        match self.seed {
            Some(seed) => SeedSource::seeded(seed),
            None => SeedSource::from_entropy(),
        }
    }
}

fn app() -> App<'static, 'static> {
    App::new("md-polymer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates chain configurations and LAMMPS input scripts for polymer chains, optionally mixed with hard-sphere crowders.")
        .arg(Arg::with_name("ROOT")
            .help("Directory containing lib/chain.f and lib/chain_alone.f")
            .required(true)
            .index(1))
        .arg(Arg::with_name("PARAMS")
            .short("p")
            .long("params")
            .help("TOML file with the system parameters (created with defaults if missing)")
            .takes_value(true))
        .arg(Arg::with_name("OUT")
            .short("o")
            .long("outdir")
            .help("Directory for generated files")
            .takes_value(true)
            .default_value("."))
        .arg(Arg::with_name("SEED")
            .long("seed")
            .help("Seed for every random number written to the outputs")
            .takes_value(true))
        .arg(Arg::with_name("FC")
            .long("compiler")
            .help("Fortran compiler used to build the chain generator")
            .takes_value(true)
            .default_value("gfortran"))
        .arg(Arg::with_name("TIMEOUT")
            .long("timeout")
            .help("Seconds each external tool may run before it is killed")
            .takes_value(true)
            .default_value("600"))
        .arg(Arg::with_name("SAVE")
            .long("save-params")
            .help("Write the effective parameters next to the generated files"))
}

// convert matches to corresponding generic types
fn conv_match<T>(matches: &ArgMatches, tag: &'static str) -> Result<T, PrepError>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let raw = matches.value_of(tag).unwrap_or_default();
    raw.parse::<T>()
        .map_err(|e| PrepError::invalid(tag, format!("{:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_args(vec!["md-polymer", "/opt/polymer"]).unwrap();
        assert_eq!(config.root, PathBuf::from("/opt/polymer"));
        assert_eq!(config.out_dir, PathBuf::from("."));
        assert_eq!(config.params, None);
        assert_eq!(config.seed, None);
        assert_eq!(config.compiler, "gfortran");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(!config.save_params);
        assert_eq!(config.load_parameters().unwrap(), SystemParameters::default());
    }

    #[test]
    fn options() {
        let config = Config::from_args(vec![
            "md-polymer",
            "/opt/polymer",
            "--outdir",
            "runs",
            "--seed",
            "17",
            "--compiler",
            "flang",
            "--timeout",
            "2.5",
            "--save-params",
        ])
        .unwrap();
        assert_eq!(config.out_dir, PathBuf::from("runs"));
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.compiler, "flang");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert!(config.save_params);
        assert_eq!(config.settings().compiler, "flang");
    }

    #[test]
    fn root_is_required() {
        assert!(Config::from_args(vec!["md-polymer"]).is_err());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Config::from_args(vec!["md-polymer", ".", "--seed", "x"]).is_err());
        assert!(Config::from_args(vec!["md-polymer", ".", "--timeout", "0"]).is_err());
    }

    #[test]
    fn parameters_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.toml");
        std::fs::write(
            &path,
            "sigma0 = 1.0\nfilename = \"melt\"\ntype_simulation = false\nnum_files = 4\n",
        )
        .unwrap();

        let config = Config::from_args(vec![
            "md-polymer".into(),
            ".".into(),
            "--params".into(),
            path.clone().into_os_string(),
        ])
        .unwrap();
        let params = config.load_parameters().unwrap();
        assert_eq!(params.sigma0, 1.0);
        assert_eq!(params.filename, "melt");
        assert!(!params.type_simulation);
        assert_eq!(params.num_files, 4);
        assert_eq!(params.mass0, 44.0);
        assert_eq!(params.nmonomers, 168);
    }
}
