use super::atoms::{Atoms, AtomsError};
use super::cell::{BoxParams, CellError, SimBox};
use super::property::{PropValue, SystemValue};
use crate::core::pbc::distance::{self, DistanceError, Points};
use crate::core::pbc::neighbors::{self, NeighborError, NeighborList};
use crate::core::pbc::transform::CoordinateTransform;
use crate::core::pbc::wrap::wrap_fractional;
use indexmap::IndexMap;
use nalgebra::Vector3;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Reserved key of [`System::prop`] holding the most recently built neighbor list.
pub const NLIST_KEY: &str = "nlist";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SystemError {
    #[error("Invalid box: {0}")]
    Cell(#[from] CellError),

    #[error("Atom store error: {0}")]
    Atoms(#[from] AtomsError),

    #[error("Distance query failed: {0}")]
    Distance(#[from] DistanceError),

    #[error("Neighbor list build failed: {0}")]
    Neighbor(#[from] NeighborError),

    #[error("Periodic boundary flags need exactly 3 values, got {0}")]
    InvalidPbc(usize),

    #[error("Atom property '{key}' holds a {kind} value and cannot be scaled")]
    NotAVector { key: String, kind: &'static str },
}

/// An atomic configuration: atoms inside a simulation box with per-axis
/// periodic boundary flags and free-form system properties.
///
/// The system exclusively owns its box and atom store. Atom positions are
/// always stored in absolute coordinates; fractional coordinates are derived
/// from the current box on every call.
///
/// Mutating operations that move atoms together with the box (`box_set` with
/// scaling, `box_normalize`, `wrap`) are read-modify-write sequences. They
/// need `&mut self`, so sharing a system across threads requires external
/// locking.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    cell: SimBox,
    atoms: Atoms,
    pbc: [bool; 3],
    prop: IndexMap<String, SystemValue>,
}

impl Default for System {
    fn default() -> Self {
        Self::new(Atoms::default(), SimBox::default(), [true; 3])
    }
}

impl System {
    /// Creates a system from atoms whose positions are absolute coordinates.
    pub fn new(atoms: Atoms, cell: SimBox, pbc: [bool; 3]) -> Self {
        Self {
            cell,
            atoms,
            pbc,
            prop: IndexMap::new(),
        }
    }

    /// Creates a system from atoms whose positions are fractional coordinates
    /// of `cell`. The positions are converted to absolute coordinates.
    pub fn from_scaled(mut atoms: Atoms, cell: SimBox, pbc: [bool; 3]) -> Self {
        let transform = CoordinateTransform::new(&cell);
        atoms.map_positions(|f| transform.unscale(f));
        Self::new(atoms, cell, pbc)
    }

    pub fn builder() -> SystemBuilder {
        SystemBuilder::new()
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn cell(&self) -> &SimBox {
        &self.cell
    }

    pub fn natoms(&self) -> usize {
        self.atoms.natoms()
    }

    pub fn natypes(&self) -> usize {
        self.atoms.natypes()
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    /// Replaces the periodic boundary flags.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::InvalidPbc`] unless exactly three flags are given.
    pub fn set_pbc(&mut self, pbc: &[bool]) -> Result<(), SystemError> {
        self.pbc = to_pbc(pbc)?;
        Ok(())
    }

    /// Free-form system properties in insertion order.
    pub fn prop(&self) -> &IndexMap<String, SystemValue> {
        &self.prop
    }

    pub fn prop_mut(&mut self) -> &mut IndexMap<String, SystemValue> {
        &mut self.prop
    }

    /// The coordinate transform of the current box.
    pub fn transform(&self) -> CoordinateTransform<'_> {
        CoordinateTransform::new(&self.cell)
    }

    /// Absolute → fractional with respect to the current box.
    pub fn scale(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.transform().scale(point)
    }

    /// Fractional → absolute with respect to the current box.
    pub fn unscale(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.transform().unscale(fractional)
    }

    pub fn scale_all(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        self.transform().scale_all(points)
    }

    pub fn unscale_all(&self, fractional: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        self.transform().unscale_all(fractional)
    }

    /// Fractional coordinates of every atom.
    pub fn scaled_positions(&self) -> Vec<Vector3<f64>> {
        self.scale_all(self.atoms.positions())
    }

    /// Per-atom property keys in use.
    pub fn atoms_keys(&self) -> Vec<&str> {
        self.atoms.keys()
    }

    /// Reads one per-atom property.
    ///
    /// With `scale` the stored absolute vector is returned as fractional
    /// coordinates of the current box.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Atoms`] for a bad index or key and
    /// [`SystemError::NotAVector`] when scaling a non-vector property.
    pub fn atoms_prop(&self, index: usize, key: &str, scale: bool) -> Result<PropValue, SystemError> {
        let value = self.atoms.get(index, key)?;
        if scale {
            self.convert(key, &value, Direction::ToFractional)
        } else {
            Ok(value)
        }
    }

    /// Reads one per-atom property of every atom, optionally as fractional coordinates.
    pub fn atoms_column(&self, key: &str, scale: bool) -> Result<Vec<PropValue>, SystemError> {
        let values = self.atoms.column(key)?;
        if scale {
            values
                .iter()
                .map(|value| self.convert(key, value, Direction::ToFractional))
                .collect()
        } else {
            Ok(values)
        }
    }

    /// Reads every property of one atom, as stored.
    pub fn atom_props(&self, index: usize) -> Result<Vec<(String, PropValue)>, SystemError> {
        Ok(self.atoms.atom(index)?)
    }

    /// Writes one per-atom property.
    ///
    /// With `scale` the value is taken as fractional coordinates of the
    /// current box and stored as the equivalent absolute vector.
    pub fn set_atoms_prop(
        &mut self,
        index: usize,
        key: &str,
        value: PropValue,
        scale: bool,
    ) -> Result<(), SystemError> {
        let value = if scale {
            self.convert(key, &value, Direction::ToAbsolute)?
        } else {
            value
        };
        self.atoms.set(index, key, value)?;
        Ok(())
    }

    /// Writes one per-atom property of every atom, optionally from fractional coordinates.
    ///
    /// Nothing is stored unless every value converts.
    pub fn set_atoms_column(
        &mut self,
        key: &str,
        values: Vec<PropValue>,
        scale: bool,
    ) -> Result<(), SystemError> {
        let values = if scale {
            values
                .iter()
                .map(|value| self.convert(key, value, Direction::ToAbsolute))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            values
        };
        self.atoms.set_column(key, values)?;
        Ok(())
    }

    /// Redefines the box.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter group defining the new box.
    /// * `scale` - If `true`, atoms keep their fractional coordinates and move
    ///   with the box. If `false`, absolute positions are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Cell`] if `params` is invalid; the system is
    /// unchanged in that case.
    #[instrument(skip_all, name = "system_box_set", fields(scale = scale))]
    pub fn box_set(&mut self, params: BoxParams, scale: bool) -> Result<(), SystemError> {
        if !scale {
            self.cell.set(params)?;
            return Ok(());
        }

        let fractional = self.scaled_positions();
        self.cell.set(params)?;
        let positions = self.unscale_all(&fractional);
        self.atoms.set_positions(positions)?;
        debug!(natoms = self.natoms(), "Atoms moved with the redefined box.");
        Ok(())
    }

    /// Reduces the box to lower-triangular form, keeping every atom's
    /// fractional coordinates.
    #[instrument(skip_all, name = "system_box_normalize")]
    pub fn box_normalize(&mut self) -> Result<(), SystemError> {
        let fractional = self.scaled_positions();
        self.cell.normalize()?;
        let positions = self.unscale_all(&fractional);
        self.atoms.set_positions(positions)?;
        debug!(
            lx = self.cell.lx(),
            ly = self.cell.ly(),
            lz = self.cell.lz(),
            "Box normalized."
        );
        Ok(())
    }

    /// Shortest displacement vectors from `pos_0` to `pos_1`.
    ///
    /// Each argument is either atom indices, resolved to the atoms' current
    /// absolute positions, or explicit absolute positions. A single point is
    /// broadcast against a batch.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Atoms`] for an out-of-range index and
    /// [`SystemError::Distance`] for incompatible batch lengths.
    pub fn dvect(
        &self,
        pos_0: impl Into<Points>,
        pos_1: impl Into<Points>,
    ) -> Result<Vec<Vector3<f64>>, SystemError> {
        let pos_0 = self.resolve_points(pos_0.into())?;
        let pos_1 = self.resolve_points(pos_1.into())?;
        Ok(distance::dvect(&pos_0, &pos_1, &self.cell, self.pbc)?)
    }

    /// Builds a neighbor list and caches it under [`NLIST_KEY`], replacing any
    /// previous list.
    ///
    /// # Arguments
    ///
    /// * `cutoff` - Radial cutoff distance, must be positive.
    /// * `cmult` - Binning granularity multiplier, at least 1.
    #[instrument(skip_all, name = "system_nlist", fields(cutoff = cutoff, cmult = cmult))]
    pub fn nlist(&mut self, cutoff: f64, cmult: usize) -> Result<(), SystemError> {
        let list = neighbors::build(self, cutoff, cmult)?;
        if self
            .prop
            .insert(NLIST_KEY.to_string(), SystemValue::NeighborList(list))
            .is_some()
        {
            trace!("Replaced the cached neighbor list.");
        }
        Ok(())
    }

    /// The neighbor list cached by the last [`System::nlist`] call.
    pub fn neighbor_list(&self) -> Option<&NeighborList> {
        self.prop.get(NLIST_KEY).and_then(SystemValue::as_neighbor_list)
    }

    /// Canonicalizes atom placement against the box.
    ///
    /// Along periodic axes every atom is wrapped into `[0, 1)` fractionally.
    /// Along non-periodic axes the box grows to contain every atom, padded by
    /// [`WRAP_PADDING`](crate::core::pbc::wrap::WRAP_PADDING) on each side that
    /// needed to grow. Absolute positions of atoms that were not wrapped are
    /// unchanged.
    #[instrument(skip_all, name = "system_wrap")]
    pub fn wrap(&mut self) -> Result<(), SystemError> {
        let transform = CoordinateTransform::new(&self.cell);
        let mut fractional = transform.scale_all(self.atoms.positions());
        let bounds = wrap_fractional(&mut fractional, self.pbc);
        self.atoms.set_positions(transform.unscale_all(&fractional))?;

        if bounds.is_identity() {
            debug!(natoms = self.natoms(), "Atoms wrapped; box unchanged.");
            return Ok(());
        }

        let extent = bounds.extent();
        let params = BoxParams::Vectors {
            avect: self.cell.avect() * extent.x,
            bvect: self.cell.bvect() * extent.y,
            cvect: self.cell.cvect() * extent.z,
            origin: Some(transform.unscale(&bounds.lower)),
        };
        self.cell.set(params)?;
        debug!(
            natoms = self.natoms(),
            lower = ?bounds.lower,
            upper = ?bounds.upper,
            "Atoms wrapped; box grown along open axes."
        );
        Ok(())
    }

    fn resolve_points(&self, points: Points) -> Result<Vec<Vector3<f64>>, SystemError> {
        match points {
            Points::Indices(indices) => indices
                .iter()
                .map(|&index| self.atoms.position(index).map_err(SystemError::from))
                .collect(),
            Points::Positions(positions) => Ok(positions),
        }
    }

    fn convert(
        &self,
        key: &str,
        value: &PropValue,
        direction: Direction,
    ) -> Result<PropValue, SystemError> {
        let vector = value.as_vector().ok_or_else(|| SystemError::NotAVector {
            key: key.to_string(),
            kind: value.kind(),
        })?;
        let converted = match direction {
            Direction::ToFractional => self.scale(&vector),
            Direction::ToAbsolute => self.unscale(&vector),
        };
        Ok(PropValue::Vector(converted))
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    ToFractional,
    ToAbsolute,
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.cell)?;
        writeln!(f, "natoms = {}", self.natoms())?;
        writeln!(f, "natypes = {}", self.natypes())?;
        write!(f, "{}", self.atoms)
    }
}

/// Step-by-step construction of a [`System`] with validated inputs.
#[derive(Default)]
pub struct SystemBuilder {
    atoms: Option<Atoms>,
    cell: Option<SimBox>,
    pbc: Option<Vec<bool>>,
    scale: bool,
    prop: IndexMap<String, SystemValue>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atoms(mut self, atoms: Atoms) -> Self {
        self.atoms = Some(atoms);
        self
    }
    pub fn cell(mut self, cell: SimBox) -> Self {
        self.cell = Some(cell);
        self
    }
    pub fn pbc(mut self, pbc: &[bool]) -> Self {
        self.pbc = Some(pbc.to_vec());
        self
    }
    /// Treat the atom positions as fractional coordinates of the box.
    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }
    pub fn prop(mut self, key: &str, value: impl Into<SystemValue>) -> Self {
        self.prop.insert(key.to_string(), value.into());
        self
    }

    /// Builds the system. Missing atoms default to an empty store, a missing
    /// box to the unit cube and missing flags to fully periodic.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::InvalidPbc`] unless exactly three periodic flags
    /// were given.
    pub fn build(self) -> Result<System, SystemError> {
        let pbc = match self.pbc {
            Some(pbc) => to_pbc(&pbc)?,
            None => [true; 3],
        };
        let atoms = self.atoms.unwrap_or_default();
        let cell = self.cell.unwrap_or_default();
        let mut system = if self.scale {
            System::from_scaled(atoms, cell, pbc)
        } else {
            System::new(atoms, cell, pbc)
        };
        system.prop = self.prop;
        Ok(system)
    }
}

fn to_pbc(pbc: &[bool]) -> Result<[bool; 3], SystemError> {
    <[bool; 3]>::try_from(pbc).map_err(|_| SystemError::InvalidPbc(pbc.len()))
}
