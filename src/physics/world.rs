//! Rigid-body world
//!
//! Owns the bodies, applies gravity and damping, and steps everything with a
//! pluggable [`Integrator`] over one flat state vector.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::body::{RigidBody, STATE_SIZE};
use super::integrator::{EulerIntegrator, Integrator};
use super::shape::Shape;
use crate::error::{OceanError, OceanResult};

/// Opaque identity of a body inside a [`World`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

impl BodyHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// World-wide simulation constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub gravity: Vec3,
    /// Linear damping coefficient (force = -damping * velocity)
    pub damping: f32,
    /// Angular damping coefficient (torque = -angular_damping * omega)
    pub angular_damping: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

/// Collection of rigid bodies stepped together
pub struct World {
    pub gravity: Vec3,
    pub damping: f32,
    pub angular_damping: f32,

    integrator: Box<dyn Integrator>,
    bodies: Vec<(BodyHandle, RigidBody)>,
    index: FxHashMap<BodyHandle, usize>,
    next_handle: u32,

    // Serialized state, its derivative, and the integrator output
    state: Vec<f32>,
    state_derivative: Vec<f32>,
    next_state: Vec<f32>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_integrator(config, Box::new(EulerIntegrator))
    }

    pub fn with_integrator(config: WorldConfig, integrator: Box<dyn Integrator>) -> Self {
        Self {
            gravity: config.gravity,
            damping: config.damping,
            angular_damping: config.angular_damping,
            integrator,
            bodies: Vec::new(),
            index: FxHashMap::default(),
            next_handle: 0,
            state: Vec::new(),
            state_derivative: Vec::new(),
            next_state: Vec::new(),
        }
    }

    /// Create a body whose inertia comes from `shape`
    ///
    /// `mass` may be `f32::INFINITY` for a static body.
    pub fn create_body(
        &mut self,
        mass: f32,
        shape: &dyn Shape,
        position: Vec3,
        orientation: Quat,
    ) -> OceanResult<BodyHandle> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(OceanError::invalid_config("mass", mass, "must be positive"));
        }

        let mut body = RigidBody::new(mass, shape.inertia_tensor(mass));
        body.set_position(position);
        body.set_rotation(orientation);
        Ok(self.add_body(body))
    }

    /// Insert an already configured body
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        self.index.insert(handle, self.bodies.len());
        self.bodies.push((handle, body));
        self.resize_state();

        log::debug!(
            "[World::add_body] body {} added ({} bodies)",
            handle.0,
            self.bodies.len()
        );
        handle
    }

    /// Remove a body, returning it if it existed
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let slot = self.index.remove(&handle)?;
        let (_, body) = self.bodies.remove(slot);

        // Later bodies shifted down by one
        for (i, (h, _)) in self.bodies.iter().enumerate().skip(slot) {
            self.index.insert(*h, i);
        }
        self.resize_state();

        log::debug!(
            "[World::destroy_body] body {} removed ({} bodies)",
            handle.0,
            self.bodies.len()
        );
        Some(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index.get(&handle).map(|&i| &self.bodies[i].1)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let i = *self.index.get(&handle)?;
        Some(&mut self.bodies[i].1)
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(h, b)| (*h, b))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advance all bodies by `dt` seconds
    ///
    /// Forces accumulated since the previous step (buoyancy, user forces) are
    /// consumed and cleared.
    pub fn integrate(&mut self, dt: f32) {
        if self.bodies.is_empty() {
            return;
        }

        self.apply_gravity();
        self.apply_damping();

        for (i, (_, body)) in self.bodies.iter().enumerate() {
            let range = i * STATE_SIZE..(i + 1) * STATE_SIZE;
            body.serialize_state(&mut self.state[range.clone()]);
            body.serialize_state_derivative(&mut self.state_derivative[range]);
        }

        self.integrator
            .integrate(&mut self.next_state, &self.state, &self.state_derivative, dt);
        std::mem::swap(&mut self.state, &mut self.next_state);

        for (i, (_, body)) in self.bodies.iter_mut().enumerate() {
            body.clear_forces();
            body.deserialize_state(&self.state[i * STATE_SIZE..(i + 1) * STATE_SIZE]);
        }
    }

    fn apply_gravity(&mut self) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut().filter(|(_, b)| b.mass().is_finite()) {
            body.apply_central_force(gravity * body.mass());
        }
    }

    fn apply_damping(&mut self) {
        if self.damping == 0.0 && self.angular_damping == 0.0 {
            return;
        }
        for (_, body) in self.bodies.iter_mut().filter(|(_, b)| b.is_dynamic()) {
            body.apply_central_force(-self.damping * body.velocity());
            body.apply_torque(-self.angular_damping * body.omega());
        }
    }

    fn resize_state(&mut self) {
        let len = self.bodies.len() * STATE_SIZE;
        self.state = vec![0.0; len];
        self.state_derivative = vec![0.0; len];
        self.next_state = vec![0.0; len];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::{Cuboid, Sphere};
    use approx::assert_relative_eq;

    fn zero_gravity_world() -> World {
        World::new(WorldConfig {
            gravity: Vec3::ZERO,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn test_momentum_conserved_without_forces() {
        let mut world = zero_gravity_world();
        let handle = world
            .create_body(2.0, &Cuboid::new(Vec3::new(1.0, 2.0, 3.0)), Vec3::ZERO, Quat::IDENTITY)
            .unwrap();
        {
            let body = world.body_mut(handle).unwrap();
            body.set_momentum(Vec3::new(1.0, 2.0, 3.0));
            body.set_angular_momentum(Vec3::new(0.1, -0.2, 0.3));
        }

        for _ in 0..200 {
            world.integrate(1.0 / 60.0);
        }

        let body = world.body(handle).unwrap();
        assert_eq!(body.momentum(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.angular_momentum(), Vec3::new(0.1, -0.2, 0.3));
        assert_relative_eq!(body.rotation().length(), 1.0, epsilon = 1e-5);
        // Constant velocity (0.5, 1, 1.5) for 200/60 s
        assert_relative_eq!(body.position().x, 0.5 * 200.0 / 60.0, epsilon = 1e-3);
    }

    #[test]
    fn test_gravity_euler_step() {
        let mut world = World::default();
        let handle = world
            .create_body(3.0, &Sphere::new(1.0), Vec3::new(0.0, 10.0, 0.0), Quat::IDENTITY)
            .unwrap();

        world.integrate(0.5);
        let body = world.body(handle).unwrap();
        // Explicit Euler moves with the old (zero) velocity
        assert_relative_eq!(body.position().y, 10.0);
        assert_relative_eq!(body.momentum().y, -9.8 * 3.0 * 0.5, epsilon = 1e-5);
        assert_eq!(body.force(), Vec3::ZERO);

        world.integrate(0.5);
        let body = world.body(handle).unwrap();
        assert_relative_eq!(body.position().y, 10.0 - 4.9 * 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_static_body_ignores_gravity() {
        let mut world = World::default();
        let handle = world
            .create_body(f32::INFINITY, &Sphere::new(1.0), Vec3::ZERO, Quat::IDENTITY)
            .unwrap();
        for _ in 0..10 {
            world.integrate(0.1);
        }
        let body = world.body(handle).unwrap();
        assert_eq!(body.position(), Vec3::ZERO);
        assert_eq!(body.momentum(), Vec3::ZERO);
    }

    #[test]
    fn test_damping_slows_bodies() {
        let mut world = World::new(WorldConfig {
            gravity: Vec3::ZERO,
            damping: 0.5,
            angular_damping: 0.5,
        });
        let handle = world
            .create_body(1.0, &Sphere::new(1.0), Vec3::ZERO, Quat::IDENTITY)
            .unwrap();
        world.body_mut(handle).unwrap().set_momentum(Vec3::X);

        world.integrate(0.1);
        assert_relative_eq!(world.body(handle).unwrap().momentum().x, 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_damping_skips_static_bodies() {
        let mut world = World::new(WorldConfig {
            gravity: Vec3::ZERO,
            damping: 2.0,
            angular_damping: 2.0,
        });
        let shape = Sphere::new(1.0);
        let pier = world
            .create_body(f32::INFINITY, &shape, Vec3::ZERO, Quat::IDENTITY)
            .unwrap();
        let buoy = world.create_body(1.0, &shape, Vec3::X, Quat::IDENTITY).unwrap();
        for handle in [pier, buoy] {
            let body = world.body_mut(handle).unwrap();
            body.set_momentum(Vec3::X);
            body.set_angular_momentum(Vec3::Y);
        }

        world.apply_damping();
        let pier_body = world.body(pier).unwrap();
        assert_eq!(pier_body.force(), Vec3::ZERO);
        assert_eq!(pier_body.torque(), Vec3::ZERO);
        assert!(world.body(buoy).unwrap().force().x < 0.0);

        world.integrate(0.1);
        assert_eq!(world.body(pier).unwrap().momentum(), Vec3::X);
        assert_eq!(world.body(pier).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn test_destroy_body_keeps_other_handles_valid() {
        let mut world = zero_gravity_world();
        let shape = Sphere::new(1.0);
        let a = world.create_body(1.0, &shape, Vec3::X, Quat::IDENTITY).unwrap();
        let b = world.create_body(1.0, &shape, Vec3::Y, Quat::IDENTITY).unwrap();
        let c = world.create_body(1.0, &shape, Vec3::Z, Quat::IDENTITY).unwrap();

        assert!(world.destroy_body(b).is_some());
        assert!(world.destroy_body(b).is_none());
        assert_eq!(world.len(), 2);
        assert_eq!(world.body(a).unwrap().position(), Vec3::X);
        assert_eq!(world.body(c).unwrap().position(), Vec3::Z);

        let order: Vec<BodyHandle> = world.bodies().map(|(h, _)| h).collect();
        assert_eq!(order, vec![a, c]);

        // Stepping after removal uses the shrunk state vector
        world.integrate(0.1);
        assert_eq!(world.body(c).unwrap().position(), Vec3::Z);
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let mut world = World::default();
        assert!(world
            .create_body(0.0, &Sphere::new(1.0), Vec3::ZERO, Quat::IDENTITY)
            .is_err());
        assert!(world
            .create_body(f32::NAN, &Sphere::new(1.0), Vec3::ZERO, Quat::IDENTITY)
            .is_err());
    }
}
