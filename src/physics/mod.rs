//! Physics Module - rigid bodies stepped by an explicit integrator

pub mod body;
pub mod integrator;
pub mod shape;
pub mod world;

pub use body::{RigidBody, STATE_SIZE};
pub use integrator::{EulerIntegrator, Integrator};
pub use shape::{Cuboid, Cylinder, Shape, Sphere};
pub use world::{BodyHandle, World, WorldConfig};
