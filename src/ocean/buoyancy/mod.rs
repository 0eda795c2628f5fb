//! Buoyancy coupling between the ocean surface and the rigid-body world

pub mod floating_body;
pub mod ocean_field_buoyancy;

pub use floating_body::{submerging, FloatingBody, FloatingBodyOptions};
pub use ocean_field_buoyancy::OceanFieldBuoyancy;
