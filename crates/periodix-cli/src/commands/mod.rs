pub mod model;
pub mod neighbors;

use crate::cli::CrystalArgs;
use crate::error::{CliError, Result};
use periodix::System;
use periodix::workflows::crystal::{self, Prototype};
use tracing::info;

/// Builds the crystal described by the shared command-line arguments.
pub fn build_crystal(args: &CrystalArgs) -> Result<System> {
    let repeat: [usize; 3] = args.repeat.as_slice().try_into().map_err(|_| {
        CliError::Argument(format!(
            "--repeat needs exactly 3 counts, got {}",
            args.repeat.len()
        ))
    })?;
    let prototype = Prototype::from(args.prototype);
    let system = crystal::build(prototype, args.lengths(), repeat)?;
    info!(
        prototype = %prototype,
        natoms = system.natoms(),
        "Built {}x{}x{} crystal.",
        repeat[0],
        repeat[1],
        repeat[2]
    );
    Ok(system)
}
