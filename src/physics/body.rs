//! Rigid body state and its derivative
//!
//! A body's primary state is position, orientation, linear momentum and
//! angular momentum (13 scalars). Velocity, angular velocity and the
//! world-space inverse inertia are derived from it and recomputed whenever
//! the primary state changes, so they are never stale.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Scalars per body in the serialized state vector:
/// position (3), orientation quaternion xyzw (4), momentum (3), angular momentum (3)
pub const STATE_SIZE: usize = 13;

/// Rigid body with constant mass and body-frame inertia
#[derive(Debug, Clone)]
pub struct RigidBody {
    mass: f32,
    inverse_mass: f32,
    inertia_body: Mat3,
    inertia_body_inv: Mat3,

    position: Vec3,
    rotation: Quat,
    momentum: Vec3,
    angular_momentum: Vec3,

    inertia_inv: Mat3,
    velocity: Vec3,
    omega: Vec3,

    force: Vec3,
    torque: Vec3,
}

impl RigidBody {
    /// Create a body at rest at the origin
    ///
    /// A non-finite mass yields a static body: its inverse mass and inverse
    /// inertia are zero, so accumulated forces never move it.
    pub fn new(mass: f32, inertia_body: Mat3) -> Self {
        let is_dynamic = mass.is_finite() && mass > 0.0;
        let inverse_mass = if is_dynamic { 1.0 / mass } else { 0.0 };
        let inertia_body_inv = if is_dynamic && inertia_body.determinant().abs() > f32::EPSILON {
            inertia_body.inverse()
        } else {
            Mat3::ZERO
        };

        let mut body = Self {
            mass,
            inverse_mass,
            inertia_body,
            inertia_body_inv,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            momentum: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            inertia_inv: Mat3::ZERO,
            velocity: Vec3::ZERO,
            omega: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        };
        body.refresh_derived();
        body
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether gravity and buoyancy act on this body
    pub fn is_dynamic(&self) -> bool {
        self.inverse_mass > 0.0
    }

    pub fn inertia_body(&self) -> Mat3 {
        self.inertia_body
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = normalize_or_identity(rotation);
        self.refresh_derived();
    }

    pub fn momentum(&self) -> Vec3 {
        self.momentum
    }

    pub fn set_momentum(&mut self, momentum: Vec3) {
        self.momentum = momentum;
        self.refresh_derived();
    }

    pub fn angular_momentum(&self) -> Vec3 {
        self.angular_momentum
    }

    pub fn set_angular_momentum(&mut self, angular_momentum: Vec3) {
        self.angular_momentum = angular_momentum;
        self.refresh_derived();
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Angular velocity in world space
    pub fn omega(&self) -> Vec3 {
        self.omega
    }

    /// World-space inverse inertia `R * Ibody^-1 * R^T`
    pub fn inertia_inv(&self) -> Mat3 {
        self.inertia_inv
    }

    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    /// Local-to-world transform
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Accumulate `force` applied at the body-local offset `at`
    ///
    /// The offset is rotated into world orientation (not translated) and the
    /// resulting lever arm adds `arm x force` to the torque.
    pub fn apply_force(&mut self, force: Vec3, at: Vec3) {
        let arm = self.rotation * at;
        self.force += force;
        self.torque += arm.cross(force);
    }

    /// Accumulate a force through the centre of mass
    pub fn apply_central_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Write the 13 primary state scalars into `out`
    pub fn serialize_state(&self, out: &mut [f32]) {
        debug_assert!(out.len() >= STATE_SIZE);
        out[0..3].copy_from_slice(&self.position.to_array());
        out[3..7].copy_from_slice(&self.rotation.to_array());
        out[7..10].copy_from_slice(&self.momentum.to_array());
        out[10..13].copy_from_slice(&self.angular_momentum.to_array());
    }

    /// Load primary state, renormalise the orientation and recompute the
    /// derived quantities
    pub fn deserialize_state(&mut self, state: &[f32]) {
        debug_assert!(state.len() >= STATE_SIZE);
        self.position = Vec3::from_slice(&state[0..3]);
        self.rotation = normalize_or_identity(Quat::from_slice(&state[3..7]));
        self.momentum = Vec3::from_slice(&state[7..10]);
        self.angular_momentum = Vec3::from_slice(&state[10..13]);
        self.refresh_derived();
    }

    /// Write the time derivative of the primary state into `out`:
    /// velocity, `0.5 * (omega, 0) * q`, force, torque
    pub fn serialize_state_derivative(&self, out: &mut [f32]) {
        debug_assert!(out.len() >= STATE_SIZE);
        let spin = Quat::from_xyzw(self.omega.x, self.omega.y, self.omega.z, 0.0);
        let rotation_rate = (spin * self.rotation) * 0.5;

        out[0..3].copy_from_slice(&self.velocity.to_array());
        out[3..7].copy_from_slice(&rotation_rate.to_array());
        out[7..10].copy_from_slice(&self.force.to_array());
        out[10..13].copy_from_slice(&self.torque.to_array());
    }

    fn refresh_derived(&mut self) {
        let r = Mat3::from_quat(self.rotation);
        self.inertia_inv = r * self.inertia_body_inv * r.transpose();
        self.velocity = self.momentum * self.inverse_mass;
        self.omega = self.inertia_inv * self.angular_momentum;
    }
}

fn normalize_or_identity(q: Quat) -> Quat {
    let length_squared = q.length_squared();
    if length_squared > f32::EPSILON && length_squared.is_finite() {
        q / length_squared.sqrt()
    } else {
        Quat::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_body() -> RigidBody {
        RigidBody::new(2.0, Mat3::IDENTITY)
    }

    #[test]
    fn test_derived_quantities_follow_state() {
        let mut body = unit_body();
        body.set_momentum(Vec3::new(4.0, 0.0, 0.0));
        body.set_angular_momentum(Vec3::new(0.0, 3.0, 0.0));

        assert_relative_eq!(body.velocity().x, 2.0);
        // Unit inertia: omega equals angular momentum
        assert_relative_eq!(body.omega().y, 3.0);
    }

    #[test]
    fn test_deserialize_normalizes_orientation() {
        let mut body = unit_body();
        let mut state = [0.0; STATE_SIZE];
        body.serialize_state(&mut state);
        // Scaled quaternion
        state[3..7].copy_from_slice(&[0.0, 0.0, 0.0, 5.0]);
        body.deserialize_state(&state);

        assert_relative_eq!(body.rotation().length(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(body.rotation().w, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_orientation_falls_back_to_identity() {
        let mut body = unit_body();
        let mut state = [0.0; STATE_SIZE];
        body.serialize_state(&mut state);
        state[3..7].copy_from_slice(&[0.0; 4]);
        body.deserialize_state(&state);
        assert_eq!(body.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_off_centre_force_produces_torque() {
        let mut body = unit_body();
        body.apply_force(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(body.force(), Vec3::new(0.0, 1.0, 0.0));
        // x cross y = z
        assert_relative_eq!(body.torque().z, 1.0);

        body.clear_forces();
        assert_eq!(body.force(), Vec3::ZERO);
        assert_eq!(body.torque(), Vec3::ZERO);
    }

    #[test]
    fn test_force_arm_follows_orientation() {
        let mut body = unit_body();
        body.set_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Local +x becomes world -z
        body.apply_force(Vec3::Y, Vec3::X);
        assert_relative_eq!(body.torque().x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(body.torque().z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_spin_derivative() {
        let mut body = unit_body();
        body.set_angular_momentum(Vec3::new(0.0, 0.0, 2.0));
        let mut derivative = [0.0; STATE_SIZE];
        body.serialize_state_derivative(&mut derivative);

        // 0.5 * (0, 0, 2, 0) * (0, 0, 0, 1) = (0, 0, 1, 0)
        assert_relative_eq!(derivative[5], 1.0);
        assert_relative_eq!(derivative[6], 0.0);
    }

    #[test]
    fn test_static_body_has_zero_inverses() {
        let mut body = RigidBody::new(f32::INFINITY, Mat3::from_diagonal(Vec3::splat(f32::INFINITY)));
        body.set_momentum(Vec3::new(1.0, 0.0, 0.0));
        body.set_angular_momentum(Vec3::ONE);

        assert!(!body.is_dynamic());
        assert_eq!(body.velocity(), Vec3::ZERO);
        assert_eq!(body.omega(), Vec3::ZERO);
    }
}
