use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use pdworld::{config::Config, error::Error, simulation::Simulation};

const DEFAULT_CONFIG: &str = "pdworld.toml";
const DEFAULT_OUTPUT: &str = "out/record.json";

fn main() -> Result<(), Error> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let output_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));

    let config = if Path::new(&config_path).exists() {
        Config::from_toml_file(&config_path)?
    } else {
        warn!("{config_path} not found, using default config");
        Config::default()
    };

    let mut sim = Simulation::new(config);
    sim.run()?;
    info!(
        "Finished after {} turns with {} terminal states",
        sim.time,
        sim.terminal_count()
    );

    if let Some(dir) = output_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&output_path, serde_json::to_string(&sim.record)?)?;
    info!("Record written to {}", output_path.display());
    Ok(())
}
