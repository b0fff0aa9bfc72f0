use anyhow::{Context, Result};
use log::info;

use md_polymer::config::Config;
use md_polymer::generator::Generator;
use md_polymer::tool::ProcessRunner;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // parse command line options
    let config = Config::new()?;
    let params = config
        .load_parameters()
        .context("failed to load system parameters")?;

    // derive reduced units before anything is written
    let mut generator = Generator::new(params, config.settings(), ProcessRunner, config.seed_source())
        .context("invalid system parameters")?;

    if config.save_params {
        let path = generator.save_parameters()?;
        info!("parameters saved to {}", path.display());
    }

    let report = generator.run().context("generation run aborted")?;

    let derived = &report.derived;
    println!("rho*      {}", derived.rho_star);
    println!("box side  {}", derived.box_side);
    println!("n_hs      {}", derived.n_hs);
    println!("particles {}", derived.npart_tot);
    for script in &report.scripts {
        println!("{}", script.display());
    }
    Ok(())
}
