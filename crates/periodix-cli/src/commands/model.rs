use crate::cli::ModelArgs;
use crate::commands::build_crystal;
use crate::config::build_model_config;
use crate::error::{CliError, Result};
use periodix::StandardUnits;
use periodix::workflows::model::build_model;
use std::io::Write;
use tracing::info;

pub fn run(args: ModelArgs) -> Result<()> {
    let config = build_model_config(&args)?;
    let system = build_crystal(&args.crystal)?;

    info!("Exporting cell model...");
    let document = build_model(&system, &config, &StandardUnits)?;
    let text = document.to_toml_string()?;
    info!(
        family = %document.family(),
        natoms = document.atoms().len(),
        "Cell model exported."
    );

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text).map_err(|e| CliError::Output {
                path: path.clone(),
                source: e,
            })?;
            println!("Cell model written to: {}", path.display());
        }
        None => {
            std::io::stdout().lock().write_all(text.as_bytes())?;
        }
    }
    Ok(())
}
