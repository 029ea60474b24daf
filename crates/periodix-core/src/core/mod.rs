//! # Core Module
//!
//! The fundamental building blocks of periodix.
//!
//! - **Data Models** ([`models`]) - Simulation box, atom store, property values and the system facade
//! - **Periodicity** ([`pbc`]) - Coordinate transform, wrapping, minimum-image distances and neighbor lists
//! - **Units** ([`units`]) - Injectable unit conversion service
//! - **Utilities** ([`utils`]) - Floating-point comparison and vector geometry helpers
//!
//! All operations are synchronous, in-memory transformations over owned data.
//! A `System` exclusively owns its box and atom store; callers sharing one
//! across threads must serialize access themselves.

pub mod models;
pub mod pbc;
pub mod units;
pub mod utils;
