use crate::core::utils::geometry::{angle_between_degrees, cos_degrees};
use nalgebra::{Matrix3, Vector3};
use std::fmt;
use thiserror::Error;

/// Relative determinant threshold below which a set of lattice vectors is
/// treated as degenerate.
const DEGENERACY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CellError {
    #[error("Box length '{name}' must be positive and finite, got {value}")]
    NonPositiveLength { name: &'static str, value: f64 },

    #[error("Box angles ({alpha}, {beta}, {gamma}) do not describe a valid cell")]
    InvalidAngles { alpha: f64, beta: f64, gamma: f64 },

    #[error("Box bounds on axis '{axis}' are inverted or empty: lo = {lo}, hi = {hi}")]
    InvalidBounds { axis: char, lo: f64, hi: f64 },

    #[error("Box vectors are degenerate (determinant {determinant})")]
    Degenerate { determinant: f64 },

    #[error("Box parameters contain a non-finite value")]
    NonFinite,
}

/// One of the mutually exclusive ways of defining a simulation box.
///
/// Each variant corresponds to a single parameter group accepted by
/// [`SimBox::set`]. Variants that take an `origin` place the box origin at
/// zero when it is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxParams {
    /// A unit cube at the coordinate origin.
    Unit,
    /// A full 3x3 matrix whose rows are the three lattice vectors.
    Vects {
        vects: Matrix3<f64>,
        origin: Option<Vector3<f64>>,
    },
    /// The three lattice vectors given individually.
    Vectors {
        avect: Vector3<f64>,
        bvect: Vector3<f64>,
        cvect: Vector3<f64>,
        origin: Option<Vector3<f64>>,
    },
    /// Vector lengths and the angles between them, in degrees.
    LengthsAngles {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
        origin: Option<Vector3<f64>>,
    },
    /// LAMMPS-style lengths along the axes plus tilt factors.
    Lammps {
        lx: f64,
        ly: f64,
        lz: f64,
        xy: f64,
        xz: f64,
        yz: f64,
        origin: Option<Vector3<f64>>,
    },
    /// LAMMPS-style bounding extents plus tilt factors. The origin is the lo corner.
    Bounds {
        xlo: f64,
        xhi: f64,
        ylo: f64,
        yhi: f64,
        zlo: f64,
        zhi: f64,
        xy: f64,
        xz: f64,
        yz: f64,
    },
}

impl BoxParams {
    /// Orthogonal box with the given edge lengths at the coordinate origin.
    pub fn lengths(a: f64, b: f64, c: f64) -> Self {
        BoxParams::LengthsAngles {
            a,
            b,
            c,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
            origin: None,
        }
    }

    /// Box from individual lattice vectors at the coordinate origin.
    pub fn vectors(avect: Vector3<f64>, bvect: Vector3<f64>, cvect: Vector3<f64>) -> Self {
        BoxParams::Vectors {
            avect,
            bvect,
            cvect,
            origin: None,
        }
    }

    /// Resolves the parameter group into a lattice matrix and an origin.
    fn resolve(&self) -> Result<(Matrix3<f64>, Vector3<f64>), CellError> {
        let (vects, origin) = match *self {
            BoxParams::Unit => (Matrix3::identity(), Vector3::zeros()),
            BoxParams::Vects { vects, origin } => (vects, origin.unwrap_or_else(Vector3::zeros)),
            BoxParams::Vectors {
                avect,
                bvect,
                cvect,
                origin,
            } => (
                Matrix3::from_rows(&[avect.transpose(), bvect.transpose(), cvect.transpose()]),
                origin.unwrap_or_else(Vector3::zeros),
            ),
            BoxParams::LengthsAngles {
                a,
                b,
                c,
                alpha,
                beta,
                gamma,
                origin,
            } => (
                lower_triangular(a, b, c, alpha, beta, gamma)?,
                origin.unwrap_or_else(Vector3::zeros),
            ),
            BoxParams::Lammps {
                lx,
                ly,
                lz,
                xy,
                xz,
                yz,
                origin,
            } => {
                check_length("lx", lx)?;
                check_length("ly", ly)?;
                check_length("lz", lz)?;
                (
                    tilted(lx, ly, lz, xy, xz, yz),
                    origin.unwrap_or_else(Vector3::zeros),
                )
            }
            BoxParams::Bounds {
                xlo,
                xhi,
                ylo,
                yhi,
                zlo,
                zhi,
                xy,
                xz,
                yz,
            } => {
                let lx = check_bounds('x', xlo, xhi)?;
                let ly = check_bounds('y', ylo, yhi)?;
                let lz = check_bounds('z', zlo, zhi)?;
                (tilted(lx, ly, lz, xy, xz, yz), Vector3::new(xlo, ylo, zlo))
            }
        };

        if vects.iter().chain(origin.iter()).any(|v| !v.is_finite()) {
            return Err(CellError::NonFinite);
        }
        check_degeneracy(&vects)?;
        Ok((vects, origin))
    }
}

/// A parallelepiped simulation box defined by three lattice vectors and an origin.
///
/// The lattice vectors are stored as the rows of a 3x3 matrix. The box is
/// guaranteed to be non-degenerate: every constructor and [`SimBox::set`]
/// rejects parameter sets whose matrix is not invertible, leaving the box
/// unchanged on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBox {
    vects: Matrix3<f64>,
    origin: Vector3<f64>,
}

impl Default for SimBox {
    fn default() -> Self {
        Self {
            vects: Matrix3::identity(),
            origin: Vector3::zeros(),
        }
    }
}

impl SimBox {
    /// Creates a new box from one parameter group.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter group defining the box.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the parameters do not describe a valid,
    /// non-degenerate box.
    pub fn new(params: BoxParams) -> Result<Self, CellError> {
        let mut cell = Self::default();
        cell.set(params)?;
        Ok(cell)
    }

    /// Creates a cubic box with edge length `a` at the coordinate origin.
    pub fn cubic(a: f64) -> Result<Self, CellError> {
        Self::new(BoxParams::lengths(a, a, a))
    }

    /// Creates an orthogonal box with edge lengths `a`, `b`, `c` at the coordinate origin.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, CellError> {
        Self::new(BoxParams::lengths(a, b, c))
    }

    /// Redefines the box from one parameter group.
    ///
    /// The parameters are fully validated before anything is committed, so a
    /// failed call leaves the box untouched.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter group defining the new box.
    ///
    /// # Errors
    ///
    /// Returns [`CellError`] if the parameters do not describe a valid,
    /// non-degenerate box.
    pub fn set(&mut self, params: BoxParams) -> Result<(), CellError> {
        let (vects, origin) = params.resolve()?;
        self.vects = vects;
        self.origin = origin;
        Ok(())
    }

    /// Reduces the lattice vectors to right-handed lower-triangular form.
    ///
    /// The new vectors have the same lengths and angles as the current ones:
    /// `avect` lies along x, `bvect` in the xy plane and `cvect` has a positive
    /// z component. The origin is unchanged.
    pub fn normalize(&mut self) -> Result<(), CellError> {
        let vects = lower_triangular(
            self.a(),
            self.b(),
            self.c(),
            self.alpha(),
            self.beta(),
            self.gamma(),
        )?;
        check_degeneracy(&vects)?;
        self.vects = vects;
        Ok(())
    }

    /// The lattice matrix; rows are `avect`, `bvect`, `cvect`.
    pub fn vects(&self) -> &Matrix3<f64> {
        &self.vects
    }

    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    pub fn avect(&self) -> Vector3<f64> {
        self.vects.row(0).transpose()
    }

    pub fn bvect(&self) -> Vector3<f64> {
        self.vects.row(1).transpose()
    }

    pub fn cvect(&self) -> Vector3<f64> {
        self.vects.row(2).transpose()
    }

    pub fn a(&self) -> f64 {
        self.avect().norm()
    }

    pub fn b(&self) -> f64 {
        self.bvect().norm()
    }

    pub fn c(&self) -> f64 {
        self.cvect().norm()
    }

    /// Angle between `bvect` and `cvect` in degrees.
    pub fn alpha(&self) -> f64 {
        angle_between_degrees(&self.bvect(), &self.cvect())
    }

    /// Angle between `avect` and `cvect` in degrees.
    pub fn beta(&self) -> f64 {
        angle_between_degrees(&self.avect(), &self.cvect())
    }

    /// Angle between `avect` and `bvect` in degrees.
    pub fn gamma(&self) -> f64 {
        angle_between_degrees(&self.avect(), &self.bvect())
    }

    // The LAMMPS-style accessors below are only meaningful for a box in
    // lower-triangular form (see `normalize`).

    pub fn lx(&self) -> f64 {
        self.vects[(0, 0)]
    }

    pub fn ly(&self) -> f64 {
        self.vects[(1, 1)]
    }

    pub fn lz(&self) -> f64 {
        self.vects[(2, 2)]
    }

    pub fn xy(&self) -> f64 {
        self.vects[(1, 0)]
    }

    pub fn xz(&self) -> f64 {
        self.vects[(2, 0)]
    }

    pub fn yz(&self) -> f64 {
        self.vects[(2, 1)]
    }

    pub fn xlo(&self) -> f64 {
        self.origin.x
    }

    pub fn xhi(&self) -> f64 {
        self.origin.x + self.lx()
    }

    pub fn ylo(&self) -> f64 {
        self.origin.y
    }

    pub fn yhi(&self) -> f64 {
        self.origin.y + self.ly()
    }

    pub fn zlo(&self) -> f64 {
        self.origin.z
    }

    pub fn zhi(&self) -> f64 {
        self.origin.z + self.lz()
    }

    pub fn volume(&self) -> f64 {
        self.vects.determinant().abs()
    }
}

impl fmt::Display for SimBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.avect();
        let b = self.bvect();
        let c = self.cvect();
        let o = self.origin;
        writeln!(f, "avect =  [{:8.3}, {:8.3}, {:8.3}]", a.x, a.y, a.z)?;
        writeln!(f, "bvect =  [{:8.3}, {:8.3}, {:8.3}]", b.x, b.y, b.z)?;
        writeln!(f, "cvect =  [{:8.3}, {:8.3}, {:8.3}]", c.x, c.y, c.z)?;
        write!(f, "origin = [{:8.3}, {:8.3}, {:8.3}]", o.x, o.y, o.z)
    }
}

fn check_length(name: &'static str, value: f64) -> Result<(), CellError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CellError::NonPositiveLength { name, value })
    }
}

fn check_bounds(axis: char, lo: f64, hi: f64) -> Result<f64, CellError> {
    let length = hi - lo;
    if length.is_finite() && length > 0.0 {
        Ok(length)
    } else {
        Err(CellError::InvalidBounds { axis, lo, hi })
    }
}

fn check_degeneracy(vects: &Matrix3<f64>) -> Result<(), CellError> {
    let determinant = vects.determinant();
    let scale: f64 = (0..3).map(|i| vects.row(i).norm()).product();
    if !determinant.is_finite() || determinant.abs() <= DEGENERACY_TOLERANCE * scale {
        return Err(CellError::Degenerate { determinant });
    }
    Ok(())
}

fn tilted(lx: f64, ly: f64, lz: f64, xy: f64, xz: f64, yz: f64) -> Matrix3<f64> {
    Matrix3::new(
        lx, 0.0, 0.0, //
        xy, ly, 0.0, //
        xz, yz, lz,
    )
}

/// Builds lower-triangular lattice vectors from lengths and angles (degrees).
fn lower_triangular(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Result<Matrix3<f64>, CellError> {
    check_length("a", a)?;
    check_length("b", b)?;
    check_length("c", c)?;

    let invalid = CellError::InvalidAngles { alpha, beta, gamma };
    let in_range = |angle: f64| angle.is_finite() && angle > 0.0 && angle < 180.0;
    if !(in_range(alpha) && in_range(beta) && in_range(gamma)) {
        return Err(invalid);
    }

    let lx = a;
    let xy = b * cos_degrees(gamma);
    let xz = c * cos_degrees(beta);
    let ly_sq = b * b - xy * xy;
    if ly_sq <= 0.0 {
        return Err(invalid);
    }
    let ly = ly_sq.sqrt();
    let yz = (b * c * cos_degrees(alpha) - xy * xz) / ly;
    let lz_sq = c * c - xz * xz - yz * yz;
    if lz_sq <= 0.0 {
        return Err(invalid);
    }

    Ok(tilted(lx, ly, lz_sq.sqrt(), xy, xz, yz))
}
