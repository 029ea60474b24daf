use super::transform::CoordinateTransform;
use crate::core::models::cell::SimBox;
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DistanceError {
    #[error("Cannot broadcast {left} positions against {right} positions")]
    ShapeMismatch { left: usize, right: usize },
}

/// One side of a displacement query: atom indices or explicit positions.
///
/// Indices are resolved against a system's current absolute positions by
/// [`System::dvect`](crate::System::dvect).
#[derive(Debug, Clone, PartialEq)]
pub enum Points {
    Indices(Vec<usize>),
    Positions(Vec<Vector3<f64>>),
}

impl Points {
    pub fn len(&self) -> usize {
        match self {
            Points::Indices(indices) => indices.len(),
            Points::Positions(positions) => positions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<usize> for Points {
    fn from(index: usize) -> Self {
        Points::Indices(vec![index])
    }
}

impl From<Vec<usize>> for Points {
    fn from(indices: Vec<usize>) -> Self {
        Points::Indices(indices)
    }
}

impl From<&[usize]> for Points {
    fn from(indices: &[usize]) -> Self {
        Points::Indices(indices.to_vec())
    }
}

impl From<Vector3<f64>> for Points {
    fn from(position: Vector3<f64>) -> Self {
        Points::Positions(vec![position])
    }
}

impl From<[f64; 3]> for Points {
    fn from(position: [f64; 3]) -> Self {
        Points::Positions(vec![Vector3::from(position)])
    }
}

impl From<Vec<Vector3<f64>>> for Points {
    fn from(positions: Vec<Vector3<f64>>) -> Self {
        Points::Positions(positions)
    }
}

impl From<&[Vector3<f64>]> for Points {
    fn from(positions: &[Vector3<f64>]) -> Self {
        Points::Positions(positions.to_vec())
    }
}

/// Shortest displacement vectors from `pos_0` to `pos_1` under periodicity.
///
/// The two batches broadcast: equal lengths pair up element-wise, and a batch
/// of one is paired with every element of the other. Each result is
/// `pos_1 - pos_0` reduced to the shortest periodic image allowed by `pbc`.
///
/// # Errors
///
/// Returns [`DistanceError::ShapeMismatch`] if the batch lengths are
/// incompatible.
pub fn dvect(
    pos_0: &[Vector3<f64>],
    pos_1: &[Vector3<f64>],
    cell: &SimBox,
    pbc: [bool; 3],
) -> Result<Vec<Vector3<f64>>, DistanceError> {
    let count = broadcast_len(pos_0.len(), pos_1.len())?;
    let transform = CoordinateTransform::new(cell);
    let pick = |points: &[Vector3<f64>], i: usize| {
        if points.len() == 1 { points[0] } else { points[i] }
    };

    Ok((0..count)
        .map(|i| minimum_image(&(pick(pos_1, i) - pick(pos_0, i)), &transform, pbc))
        .collect())
}

fn broadcast_len(left: usize, right: usize) -> Result<usize, DistanceError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (left, right) => Err(DistanceError::ShapeMismatch { left, right }),
    }
}

/// Reduces a displacement to its shortest periodic image.
///
/// The displacement is first brought into `[-0.5, 0.5]` fractionally on each
/// periodic axis, then the neighboring images are searched, which is needed
/// for strongly tilted boxes.
pub fn minimum_image(
    delta: &Vector3<f64>,
    transform: &CoordinateTransform<'_>,
    pbc: [bool; 3],
) -> Vector3<f64> {
    let mut fractional = transform.scale_displacement(delta);
    for axis in 0..3 {
        if pbc[axis] {
            fractional[axis] -= fractional[axis].round();
        }
    }
    let reduced = transform.unscale_displacement(&fractional);

    let shifts = |axis: usize| if pbc[axis] { -1..=1 } else { 0..=0 };
    let mut best = reduced;
    let mut best_norm = reduced.norm_squared();
    for i in shifts(0) {
        for j in shifts(1) {
            for k in shifts(2) {
                if i == 0 && j == 0 && k == 0 {
                    continue;
                }
                let image = Vector3::new(f64::from(i), f64::from(j), f64::from(k));
                let candidate = reduced + transform.unscale_displacement(&image);
                let norm = candidate.norm_squared();
                if norm < best_norm {
                    best = candidate;
                    best_norm = norm;
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::cell::BoxParams;

    #[test]
    fn periodic_displacement_takes_shortest_image() {
        let cell = SimBox::cubic(10.0).unwrap();
        let result = dvect(
            &[Vector3::new(1.0, 1.0, 1.0)],
            &[Vector3::new(9.0, 1.0, 5.0)],
            &cell,
            [true; 3],
        )
        .unwrap();
        assert!((result[0] - Vector3::new(-2.0, 0.0, 4.0)).norm() < 1e-12);
    }

    #[test]
    fn non_periodic_axes_are_not_reduced() {
        let cell = SimBox::cubic(10.0).unwrap();
        let result = dvect(
            &[Vector3::new(1.0, 1.0, 1.0)],
            &[Vector3::new(9.0, 9.0, 1.0)],
            &cell,
            [false, true, true],
        )
        .unwrap();
        assert!((result[0] - Vector3::new(8.0, -2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn single_position_broadcasts_against_batch() {
        let cell = SimBox::cubic(10.0).unwrap();
        let others = vec![
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(0.0, 0.0, 9.0),
        ];

        let forward = dvect(&[Vector3::zeros()], &others, &cell, [true; 3]).unwrap();
        let backward = dvect(&others, &[Vector3::zeros()], &cell, [true; 3]).unwrap();

        assert_eq!(forward.len(), 3);
        assert!((forward[2] - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
        for (f, b) in forward.iter().zip(&backward) {
            assert!((f + b).norm() < 1e-12);
        }
    }

    #[test]
    fn incompatible_batches_are_rejected() {
        let cell = SimBox::default();
        let result = dvect(&[Vector3::zeros(); 2], &[Vector3::zeros(); 3], &cell, [true; 3]);
        assert_eq!(
            result,
            Err(DistanceError::ShapeMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn tilted_box_finds_true_minimum_image() {
        let cell = SimBox::new(BoxParams::Lammps {
            lx: 10.0,
            ly: 10.0,
            lz: 10.0,
            xy: 7.0,
            xz: 0.0,
            yz: 0.0,
            origin: None,
        })
        .unwrap();
        let transform = CoordinateTransform::new(&cell);
        let delta = Vector3::new(3.0, 9.0, 0.0);

        let reduced = minimum_image(&delta, &transform, [true; 3]);

        // delta - bvect
        assert!((reduced - Vector3::new(-4.0, -1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn points_conversions_cover_indices_and_positions() {
        assert_eq!(Points::from(3), Points::Indices(vec![3]));
        assert_eq!(
            Points::from([1.0, 2.0, 3.0]),
            Points::Positions(vec![Vector3::new(1.0, 2.0, 3.0)])
        );
        assert_eq!(Points::from(vec![0, 1]).len(), 2);
        assert!(Points::Positions(vec![]).is_empty());
    }
}
