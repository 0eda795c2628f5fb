//! Collision shapes used to derive body-frame inertia tensors
//!
//! Only mass distribution matters here; the shapes carry no collision
//! geometry.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Anything that can report its inertia tensor for a given mass
pub trait Shape {
    /// Body-frame inertia tensor about the centre of mass
    fn inertia_tensor(&self, mass: f32) -> Mat3;
}

/// Solid box with full edge lengths `size`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub size: Vec3,
}

/// Solid sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub radius: f32,
}

/// Solid cylinder with its axis along local z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub height: f32,
    pub radius: f32,
}

impl Cuboid {
    pub fn new(size: Vec3) -> Self {
        Self { size }
    }
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Cylinder {
    pub fn new(height: f32, radius: f32) -> Self {
        Self { height, radius }
    }
}

impl Shape for Cuboid {
    fn inertia_tensor(&self, mass: f32) -> Mat3 {
        let s2 = self.size * self.size;
        let k = mass / 12.0;
        Mat3::from_diagonal(Vec3::new(
            k * (s2.y + s2.z),
            k * (s2.x + s2.z),
            k * (s2.x + s2.y),
        ))
    }
}

impl Shape for Sphere {
    fn inertia_tensor(&self, mass: f32) -> Mat3 {
        Mat3::from_diagonal(Vec3::splat(0.4 * mass * self.radius * self.radius))
    }
}

impl Shape for Cylinder {
    fn inertia_tensor(&self, mass: f32) -> Mat3 {
        let r2 = self.radius * self.radius;
        let h2 = self.height * self.height;
        let lateral = 0.25 * mass * r2 + mass * h2 / 12.0;
        Mat3::from_diagonal(Vec3::new(lateral, lateral, 0.5 * mass * r2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_inertia_is_isotropic() {
        let inertia = Cuboid::new(Vec3::splat(2.0)).inertia_tensor(3.0);
        // 3/12 * (4 + 4)
        assert_relative_eq!(inertia.x_axis.x, 2.0);
        assert_relative_eq!(inertia.y_axis.y, 2.0);
        assert_relative_eq!(inertia.z_axis.z, 2.0);
        assert_eq!(inertia.x_axis.y, 0.0);
    }

    #[test]
    fn test_sphere_and_cylinder_inertia() {
        let sphere = Sphere::new(0.5).inertia_tensor(10.0);
        assert_relative_eq!(sphere.x_axis.x, 1.0);

        let cylinder = Cylinder::new(2.0, 1.0).inertia_tensor(12.0);
        assert_relative_eq!(cylinder.x_axis.x, 3.0 + 4.0);
        assert_relative_eq!(cylinder.y_axis.y, 7.0);
        assert_relative_eq!(cylinder.z_axis.z, 6.0);
    }
}
