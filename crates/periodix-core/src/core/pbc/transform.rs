use crate::core::models::cell::SimBox;
use nalgebra::{Matrix3, Vector3};

/// Converts between absolute and box-relative (fractional) coordinates.
///
/// With the lattice vectors stacked as the rows of `M` and origin `o`, a
/// point `v` maps to `(v - o) · M⁻¹` and back to `f · M + o` (row-vector
/// convention).
///
/// The transform borrows the box it was built from, so the box cannot be
/// mutated while the transform is alive and the inverse can never be stale.
///
/// A singular box matrix is a violated precondition of [`SimBox`], not an
/// error of this type: the results are then NaN.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransform<'a> {
    cell: &'a SimBox,
    inverse: Matrix3<f64>,
}

impl<'a> CoordinateTransform<'a> {
    pub fn new(cell: &'a SimBox) -> Self {
        let inverse = cell
            .vects()
            .try_inverse()
            .unwrap_or_else(|| Matrix3::from_element(f64::NAN));
        Self { cell, inverse }
    }

    pub fn cell(&self) -> &'a SimBox {
        self.cell
    }

    /// Absolute → fractional.
    pub fn scale(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.inverse.tr_mul(&(point - self.cell.origin()))
    }

    /// Fractional → absolute.
    pub fn unscale(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.cell.vects().tr_mul(fractional) + self.cell.origin()
    }

    /// Absolute → fractional for a displacement (no origin shift).
    pub fn scale_displacement(&self, delta: &Vector3<f64>) -> Vector3<f64> {
        self.inverse.tr_mul(delta)
    }

    /// Fractional → absolute for a displacement (no origin shift).
    pub fn unscale_displacement(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.cell.vects().tr_mul(fractional)
    }

    pub fn scale_all(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        points.iter().map(|p| self.scale(p)).collect()
    }

    pub fn unscale_all(&self, fractional: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        fractional.iter().map(|f| self.unscale(f)).collect()
    }
}
