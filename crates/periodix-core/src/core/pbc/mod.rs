//! Periodicity handling.
//!
//! Everything in this module is a pure function of a box, the periodic
//! boundary flags and a batch of positions. The [`System`](crate::System)
//! facade wires these routines to its own state.

pub mod distance;
pub mod neighbors;
pub mod transform;
pub mod wrap;
