//! High-level procedures built on the core data models.
//!
//! - [`model`] exports a [`System`](crate::System) as a structured crystallographic cell document.
//! - [`config`] holds the options of that export, loadable from TOML.
//! - [`crystal`] generates prototype crystal structures.

pub mod config;
pub mod crystal;
pub mod model;
