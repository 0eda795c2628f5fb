//! Per-body buoyancy coefficients and force model

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::{BodyHandle, RigidBody};

/// Buoyancy coefficients of one floating body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FloatingBodyOptions {
    /// Depth below the surface at which a floater is fully submerged
    pub submerge_depth: f32,
    pub buoyancy_strength: f32,
    pub water_drag: f32,
    pub water_angular_drag: f32,
    pub gravity: Vec3,
}

impl Default for FloatingBodyOptions {
    fn default() -> Self {
        Self {
            submerge_depth: 1.0,
            buoyancy_strength: 0.75,
            water_drag: 1.0,
            water_angular_drag: 0.75,
            gravity: Vec3::new(0.0, -9.8, 0.0),
        }
    }
}

/// A rigid body and the local points it samples the water at
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingBody {
    body: BodyHandle,
    floaters: Vec<Vec3>,
    options: FloatingBodyOptions,
}

impl FloatingBody {
    pub fn new(body: BodyHandle, floaters: Vec<Vec3>, options: FloatingBodyOptions) -> Self {
        Self {
            body,
            floaters,
            options,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Body-local sample points
    pub fn floaters(&self) -> &[Vec3] {
        &self.floaters
    }

    pub fn options(&self) -> &FloatingBodyOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut FloatingBodyOptions {
        &mut self.options
    }

    /// Accumulate buoyancy and drag on `body`
    ///
    /// `sampled[i]` is the water sample `(x, height, z)` taken at
    /// `world[i]`, the world position of floater `i` when the sample was
    /// issued. Floaters above the surface contribute nothing.
    pub fn apply_forces(&self, body: &mut RigidBody, sampled: &[Vec3], world: &[Vec3]) {
        let options = &self.options;
        for ((floater, water), position) in self.floaters.iter().zip(sampled).zip(world) {
            let submerging = submerging(water.y, position.y, options.submerge_depth);
            if submerging <= 0.0 {
                continue;
            }

            body.apply_force(
                options.gravity * (-body.mass() * submerging * options.buoyancy_strength),
                *floater,
            );
            body.apply_central_force(body.velocity() * (-options.water_drag * submerging));
            body.apply_torque(body.omega() * (-options.water_angular_drag * submerging));
        }
    }
}

/// Pure function - submerged fraction in `[0, 1]` of a point at
/// `point_y` under a surface at `wave_height`
pub fn submerging(wave_height: f32, point_y: f32, submerge_depth: f32) -> f32 {
    if wave_height <= point_y {
        return 0.0;
    }
    ((wave_height - point_y) / submerge_depth).clamp(0.0, 1.0)
}
