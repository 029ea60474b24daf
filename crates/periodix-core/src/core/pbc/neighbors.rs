use super::transform::CoordinateTransform;
use crate::core::models::cell::SimBox;
use crate::core::models::system::System;
use itertools::iproduct;
use nalgebra::Vector3;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NeighborError {
    #[error("Neighbor cutoff must be positive and finite, got {0}")]
    InvalidCutoff(f64),

    #[error("Neighbor cell multiplier must be at least 1, got {0}")]
    InvalidMultiplier(usize),
}

/// Per-atom lists of neighboring atom indices.
///
/// Each row holds one entry per periodic image within the cutoff, sorted in
/// ascending order. In cells smaller than twice the cutoff an index can
/// therefore repeat, and an atom can list its own images. The relation is
/// symmetric with multiplicity: `j` appears in row `i` as often as `i`
/// appears in row `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList {
    cutoff: f64,
    cmult: usize,
    neighbors: Vec<Vec<usize>>,
}

impl NeighborList {
    /// The radial cutoff the list was built with.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// The cell multiplier the list was built with.
    pub fn cmult(&self) -> usize {
        self.cmult
    }

    /// Number of atoms covered by the list.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Neighbor indices of atom `index`, or `None` if it is out of range.
    pub fn neighbors(&self, index: usize) -> Option<&[usize]> {
        self.neighbors.get(index).map(Vec::as_slice)
    }

    /// Coordination number of atom `index`, or `None` if it is out of range.
    pub fn coord(&self, index: usize) -> Option<usize> {
        self.neighbors.get(index).map(Vec::len)
    }

    /// Number of neighbor pairs, counting each periodic image once.
    pub fn pair_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.neighbors
            .iter()
            .enumerate()
            .map(|(i, list)| (i, list.as_slice()))
    }
}

/// Builds a neighbor list for every atom of `system`.
///
/// Two atoms are neighbors when an image of their separation is strictly
/// shorter than `cutoff`. Every periodic image within the cutoff is counted,
/// so cutoffs larger than half the box width give complete shells.
///
/// # Arguments
///
/// * `system` - The system whose atoms, box and periodicity are used.
/// * `cutoff` - Radial cutoff distance.
/// * `cmult` - Spatial binning granularity multiplier (`1` is the default).
///   It is validated and recorded on the list; the search itself is an
///   all-pairs scan.
///
/// # Errors
///
/// Returns [`NeighborError`] for a non-positive cutoff or a zero multiplier.
#[instrument(skip_all, name = "neighbor_list_build")]
pub fn build(system: &System, cutoff: f64, cmult: usize) -> Result<NeighborList, NeighborError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(NeighborError::InvalidCutoff(cutoff));
    }
    if cmult == 0 {
        return Err(NeighborError::InvalidMultiplier(cmult));
    }

    let positions = system.atoms().positions();
    let transform = CoordinateTransform::new(system.cell());
    let pbc = system.pbc();
    let reach = image_reach(system.cell(), pbc, cutoff);
    if reach.iter().any(|&n| n > 0) {
        debug!(?reach, "Cutoff spans more than one periodic image.");
    }
    let shifts: Vec<Vector3<f64>> = iproduct!(
        -reach[0]..=reach[0],
        -reach[1]..=reach[1],
        -reach[2]..=reach[2]
    )
    .map(|(i, j, k)| Vector3::new(f64::from(i), f64::from(j), f64::from(k)))
    .collect();
    let cutoff_sq = cutoff * cutoff;

    let row = |i: usize| -> Vec<usize> {
        let mut row = Vec::new();
        for (j, position) in positions.iter().enumerate() {
            let mut fractional = transform.scale_displacement(&(position - positions[i]));
            for axis in 0..3 {
                if pbc[axis] {
                    fractional[axis] -= fractional[axis].round();
                }
            }
            for shift in &shifts {
                if i == j && *shift == Vector3::zeros() {
                    continue;
                }
                let delta = transform.unscale_displacement(&(fractional + shift));
                if delta.norm_squared() < cutoff_sq {
                    row.push(j);
                }
            }
        }
        row
    };

    #[cfg(not(feature = "parallel"))]
    let neighbors: Vec<Vec<usize>> = (0..positions.len()).map(row).collect();

    #[cfg(feature = "parallel")]
    let neighbors: Vec<Vec<usize>> = (0..positions.len()).into_par_iter().map(row).collect();

    let list = NeighborList {
        cutoff,
        cmult,
        neighbors,
    };
    debug!(
        natoms = list.len(),
        pairs = list.pair_count(),
        cutoff,
        "Neighbor list built."
    );
    Ok(list)
}

/// Number of periodic images to search on each side along every axis.
///
/// After reduction a fractional separation lies in `[-0.5, 0.5]`, so an image
/// `n` cells away is at least `(|n| - 0.5) * width` from the atom, where
/// `width` is the distance between the two cell faces spanned by the other
/// vectors.
fn image_reach(cell: &SimBox, pbc: [bool; 3], cutoff: f64) -> [i32; 3] {
    let vects = [cell.avect(), cell.bvect(), cell.cvect()];
    let volume = cell.volume().abs();
    let mut reach = [0; 3];
    for axis in 0..3 {
        if !pbc[axis] {
            continue;
        }
        let face = vects[(axis + 1) % 3].cross(&vects[(axis + 2) % 3]).norm();
        let width = volume / face;
        reach[axis] = (cutoff / width + 0.5).floor() as i32;
    }
    reach
}
