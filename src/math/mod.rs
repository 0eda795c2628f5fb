//! Math kernel
//!
//! Flat-slice vector routines used by the integrator. Rigid-body frames use
//! `glam` types directly.

pub mod vector;

pub use vector::{add, add_scaled, copy, dot, lin_comb, mat_vec, mul};
