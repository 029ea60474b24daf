use crate::core::models::atoms::{Atoms, AtomsError};
use crate::core::models::cell::{CellError, SimBox};
use crate::core::models::system::System;
use itertools::iproduct;
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CrystalError {
    #[error("Unknown crystal prototype '{0}'")]
    UnknownPrototype(String),

    #[error("Repeat counts must be at least 1, got {0:?}")]
    EmptyRepeat([usize; 3]),

    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),

    #[error("Invalid atoms: {0}")]
    Atoms(#[from] AtomsError),
}

/// A cubic-derived crystal prototype with a fixed basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prototype {
    /// Simple cubic, one atom per cell.
    SimpleCubic,
    /// Body-centered cubic (A2), two atoms of one type.
    BodyCentered,
    /// Face-centered cubic (A1), four atoms of one type.
    FaceCentered,
    /// CsCl structure, two types at corner and body center.
    B2,
    /// Cu3Au structure, type 1 at the corner and type 2 at the face centers.
    L12,
}

const SC_BASIS: &[(u32, [f64; 3])] = &[(1, [0.0, 0.0, 0.0])];

const BCC_BASIS: &[(u32, [f64; 3])] = &[(1, [0.0, 0.0, 0.0]), (1, [0.5, 0.5, 0.5])];

const FCC_BASIS: &[(u32, [f64; 3])] = &[
    (1, [0.0, 0.0, 0.0]),
    (1, [0.5, 0.5, 0.0]),
    (1, [0.5, 0.0, 0.5]),
    (1, [0.0, 0.5, 0.5]),
];

const B2_BASIS: &[(u32, [f64; 3])] = &[(1, [0.0, 0.0, 0.0]), (2, [0.5, 0.5, 0.5])];

const L12_BASIS: &[(u32, [f64; 3])] = &[
    (1, [0.0, 0.0, 0.0]),
    (2, [0.5, 0.5, 0.0]),
    (2, [0.5, 0.0, 0.5]),
    (2, [0.0, 0.5, 0.5]),
];

impl Prototype {
    pub const ALL: [Prototype; 5] = [
        Prototype::SimpleCubic,
        Prototype::BodyCentered,
        Prototype::FaceCentered,
        Prototype::B2,
        Prototype::L12,
    ];

    /// Atom types and fractional positions of one unit cell.
    pub fn basis(&self) -> &'static [(u32, [f64; 3])] {
        match self {
            Prototype::SimpleCubic => SC_BASIS,
            Prototype::BodyCentered => BCC_BASIS,
            Prototype::FaceCentered => FCC_BASIS,
            Prototype::B2 => B2_BASIS,
            Prototype::L12 => L12_BASIS,
        }
    }

    pub fn natypes(&self) -> usize {
        match self {
            Prototype::B2 | Prototype::L12 => 2,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Prototype::SimpleCubic => "sc",
            Prototype::BodyCentered => "bcc",
            Prototype::FaceCentered => "fcc",
            Prototype::B2 => "b2",
            Prototype::L12 => "l12",
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Prototype {
    type Err = CrystalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Prototype::ALL
            .into_iter()
            .find(|prototype| prototype.name() == name)
            .ok_or_else(|| CrystalError::UnknownPrototype(s.to_string()))
    }
}

/// Builds a fully periodic crystal by replicating a prototype unit cell.
///
/// # Arguments
///
/// * `prototype` - The unit cell basis.
/// * `lengths` - Unit cell edge lengths `[a, b, c]`.
/// * `repeat` - Number of unit cells along each axis.
///
/// # Return
///
/// A system in an orthogonal box of size `lengths[i] * repeat[i]`. Atoms are
/// ordered by cell (x slowest) and by basis site within each cell.
///
/// # Errors
///
/// Returns [`CrystalError::EmptyRepeat`] if any repeat count is zero and
/// [`CrystalError::Cell`] for non-positive lengths.
#[instrument(skip_all, name = "crystal_build", fields(prototype = %prototype))]
pub fn build(
    prototype: Prototype,
    lengths: [f64; 3],
    repeat: [usize; 3],
) -> Result<System, CrystalError> {
    if repeat.contains(&0) {
        return Err(CrystalError::EmptyRepeat(repeat));
    }
    let [nx, ny, nz] = repeat;
    let cell = SimBox::orthorhombic(
        lengths[0] * nx as f64,
        lengths[1] * ny as f64,
        lengths[2] * nz as f64,
    )?;

    let counts = Vector3::new(nx as f64, ny as f64, nz as f64);
    let (atypes, fractional): (Vec<u32>, Vec<Vector3<f64>>) =
        iproduct!(0..nx, 0..ny, 0..nz, prototype.basis())
            .map(|(i, j, k, (atype, site))| {
                let offset = Vector3::new(i as f64, j as f64, k as f64);
                (*atype, (offset + Vector3::from(*site)).component_div(&counts))
            })
            .unzip();

    let atoms = Atoms::from_parts(atypes, fractional)?;
    let system = System::from_scaled(atoms, cell, [true; 3]);
    debug!(natoms = system.natoms(), "Crystal built.");
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_counts_scale_with_repeats() {
        for (prototype, per_cell) in [
            (Prototype::SimpleCubic, 1),
            (Prototype::BodyCentered, 2),
            (Prototype::FaceCentered, 4),
            (Prototype::B2, 2),
            (Prototype::L12, 4),
        ] {
            let system = build(prototype, [3.0; 3], [2, 3, 1]).unwrap();
            assert_eq!(system.natoms(), per_cell * 6, "{}", prototype);
            assert_eq!(system.natypes(), prototype.natypes());
        }
    }

    #[test]
    fn supercell_box_and_positions_are_absolute() {
        let system = build(Prototype::BodyCentered, [2.0, 3.0, 4.0], [2, 1, 1]).unwrap();
        assert!((system.cell().a() - 4.0).abs() < 1e-12);
        assert!((system.cell().b() - 3.0).abs() < 1e-12);
        assert!((system.cell().c() - 4.0).abs() < 1e-12);
        assert_eq!(system.pbc(), [true; 3]);

        let positions = system.atoms().positions();
        assert!((positions[1] - Vector3::new(1.0, 1.5, 2.0)).norm() < 1e-12);
        assert!((positions[2] - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn l12_places_second_type_on_faces() {
        let system = build(Prototype::L12, [4.0; 3], [1, 1, 1]).unwrap();
        assert_eq!(system.atoms().atypes(), &[1, 2, 2, 2]);
    }

    #[test]
    fn fcc_nearest_neighbors_have_coordination_twelve() {
        let a = 3.6;
        let mut system = build(Prototype::FaceCentered, [a; 3], [3, 3, 3]).unwrap();
        system.nlist(a / 2.0_f64.sqrt() + 0.1, 1).unwrap();
        let list = system.neighbor_list().unwrap();
        assert!((0..list.len()).all(|i| list.coord(i) == Some(12)));
    }

    #[test]
    fn prototypes_parse_by_name() {
        assert_eq!("FCC".parse::<Prototype>().unwrap(), Prototype::FaceCentered);
        assert_eq!("l12".parse::<Prototype>().unwrap(), Prototype::L12);
        assert!(matches!(
            "hcp".parse::<Prototype>(),
            Err(CrystalError::UnknownPrototype(_))
        ));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert_eq!(
            build(Prototype::SimpleCubic, [1.0; 3], [1, 0, 1]),
            Err(CrystalError::EmptyRepeat([1, 0, 1]))
        );
        assert!(matches!(
            build(Prototype::SimpleCubic, [1.0, -1.0, 1.0], [1, 1, 1]),
            Err(CrystalError::Cell(_))
        ));
    }
}
