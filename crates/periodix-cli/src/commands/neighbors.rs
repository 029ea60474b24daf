use crate::cli::NeighborsArgs;
use crate::commands::build_crystal;
use crate::error::{CliError, Result};
use periodix::core::pbc::neighbors::NeighborList;
use tracing::info;

/// Coordination statistics of a neighbor list.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationSummary {
    pub natoms: usize,
    pub pairs: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

impl CoordinationSummary {
    pub fn from_list(list: &NeighborList) -> Self {
        let coords: Vec<usize> = list.iter().map(|(_, neighbors)| neighbors.len()).collect();
        let natoms = coords.len();
        let mean = if natoms == 0 {
            0.0
        } else {
            coords.iter().sum::<usize>() as f64 / natoms as f64
        };
        Self {
            natoms,
            pairs: list.pair_count(),
            min: coords.iter().copied().min().unwrap_or(0),
            max: coords.iter().copied().max().unwrap_or(0),
            mean,
        }
    }
}

pub fn run(args: NeighborsArgs) -> Result<()> {
    let mut system = build_crystal(&args.crystal)?;

    info!("Building neighbor list...");
    system.nlist(args.cutoff, args.cmult)?;
    let list = system
        .neighbor_list()
        .ok_or_else(|| CliError::Other(anyhow::anyhow!("Neighbor list was not cached")))?;
    let summary = CoordinationSummary::from_list(list);

    println!("natoms       = {}", summary.natoms);
    println!("pairs        = {}", summary.pairs);
    println!(
        "coordination = min {} / max {} / mean {:.3}",
        summary.min, summary.max, summary.mean
    );
    Ok(())
}
