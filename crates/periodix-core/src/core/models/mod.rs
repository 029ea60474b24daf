//! # Core Models Module
//!
//! Data structures representing a periodic atomic configuration.
//!
//! ## Key Components
//!
//! - [`cell`] - The simulation box: lattice vectors, origin and the `set`/`normalize` contract
//! - [`atoms`] - Ordered per-atom property storage with the reserved `atype` and `pos` columns
//! - [`property`] - Tagged values stored per atom and in the free-form system properties
//! - [`system`] - The `System` facade owning a box, an atom store and the periodicity flags
//!
//! ## Usage
//!
//! ```ignore
//! use periodix::{Atoms, BoxParams, SimBox, System};
//! use nalgebra::Vector3;
//!
//! let cell = SimBox::cubic(4.0)?;
//! let atoms = Atoms::from_parts(vec![1, 1], vec![Vector3::zeros(), Vector3::new(2.0, 2.0, 2.0)])?;
//! let mut system = System::new(atoms, cell, [true, true, true]);
//!
//! system.box_set(BoxParams::lengths(5.0, 5.0, 5.0), true)?;
//! system.wrap()?;
//! ```

pub mod atoms;
pub mod cell;
pub mod property;
pub mod system;
