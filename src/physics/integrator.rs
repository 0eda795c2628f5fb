//! State-vector integrators

use crate::math::vector;

/// Advances a flat state vector by one step
pub trait Integrator: Send + Sync {
    /// Write the state at `t + dt` into `out`, given state `x` and its
    /// derivative `dxdt` at `t`
    fn integrate(&self, out: &mut [f32], x: &[f32], dxdt: &[f32], dt: f32);
}

/// Explicit (forward) Euler: `out = x + dxdt * dt`
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn integrate(&self, out: &mut [f32], x: &[f32], dxdt: &[f32], dt: f32) {
        vector::add_scaled(out, x, dxdt, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_step() {
        let mut out = [0.0; 3];
        EulerIntegrator.integrate(&mut out, &[1.0, 2.0, 3.0], &[10.0, 0.0, -10.0], 0.1);
        assert_eq!(out, [2.0, 2.0, 2.0]);
    }
}
