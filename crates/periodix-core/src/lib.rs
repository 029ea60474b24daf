//! # periodix
//!
//! A library for periodic atomic configurations: a set of atoms embedded in a
//! parallelepiped simulation box with per-axis periodic boundary flags.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction.
//!
//! - **[`core`]: The Foundation.** Value types for the simulation box (`SimBox`),
//!   the atom store (`Atoms`) and the `System` that composes them, together with
//!   the coordinate transform, boundary wrapping, minimum-image distances,
//!   neighbor lists and the unit conversion service.
//!
//! - **[`workflows`]: The Public API.** Higher-level procedures built on top of
//!   `core`: exporting a system as a structured crystallographic cell model and
//!   generating prototype crystals.
//!
//! ## Coordinates
//!
//! Atom positions are always stored in absolute (lab-frame) coordinates.
//! Fractional coordinates are computed on demand from the current box and are
//! never cached across a box mutation.

pub mod core;
pub mod workflows;

pub use crate::core::models::atoms::Atoms;
pub use crate::core::models::cell::{BoxParams, SimBox};
pub use crate::core::models::property::{PropValue, SystemValue};
pub use crate::core::models::system::{System, SystemBuilder, SystemError};
pub use crate::core::pbc::distance::Points;
pub use crate::core::pbc::neighbors::NeighborList;
pub use crate::core::units::{StandardUnits, UnitConverter};
