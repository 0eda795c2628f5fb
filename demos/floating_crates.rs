//! Crates bobbing on an FFT ocean
//!
//! Builds an ocean field on the GPU (falling back to the CPU reference
//! field when no adapter is available), drops a few crates with a floater
//! at each corner and prints their poses once per simulated second.
//!
//! Usage: `cargo run --example floating_crates [config.toml]`

use std::sync::Arc;

use anyhow::Result;
use glam::{Quat, Vec3};
use ocean_field::{
    physics::Cuboid, CpuOceanFieldBuilder, GpuContext, OceanFieldBuilder, OceanFieldBuoyancy,
    OceanSurface, SimulationConfig, World,
};

const FRAME_RATE: u32 = 60;
const SECONDS: u32 = 10;

fn create_surface(config: &SimulationConfig) -> Result<Box<dyn OceanSurface>> {
    match GpuContext::new_blocking() {
        Ok(gpu) => {
            let mut builder = OceanFieldBuilder::new(Arc::new(gpu))?;
            Ok(Box::new(builder.build(config.ocean.clone())?))
        }
        Err(e) => {
            log::warn!("GPU unavailable ({}), using the CPU reference field", e);
            let mut builder = CpuOceanFieldBuilder::new();
            Ok(Box::new(builder.build(config.ocean.clone())?))
        }
    }
}

fn corners(size: Vec3) -> Vec<Vec3> {
    let half = size * 0.5;
    let mut corners = Vec::with_capacity(8);
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners.push(half * Vec3::new(x, y, z));
            }
        }
    }
    corners
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    println!("Floating Crates");
    println!("===============");

    let mut surface = create_surface(&config)?;
    let params = surface.params().clone();
    println!(
        "Ocean: resolution {} with {} cascades, wind ({:.1}, {:.1})",
        params.resolution,
        params.cascades.len(),
        params.wind.x,
        params.wind.y
    );

    let mut world = World::new(config.world);
    let mut buoyancy = OceanFieldBuoyancy::with_sample_lifetime(config.sample_lifetime());

    let size = Vec3::new(2.0, 1.0, 2.0);
    let shape = Cuboid::new(size);
    let mut crates = Vec::new();
    for i in 0..4 {
        let position = Vec3::new(i as f32 * 6.0 - 9.0, 2.0, 0.0);
        let rotation = Quat::from_rotation_y(i as f32 * 0.4);
        let handle = world.create_body(40.0, &shape, position, rotation)?;
        buoyancy.create_floating_body(handle, corners(size), config.floating_body);
        crates.push(handle);
    }

    let dt = 1.0 / FRAME_RATE as f32;
    for frame in 0..FRAME_RATE * SECONDS {
        let time = frame as f32 * dt;

        buoyancy.update(surface.as_ref(), &mut world)?;
        world.integrate(dt);
        surface.update(time)?;

        if frame % FRAME_RATE == 0 {
            println!("\nt = {:.0}s", time);
            for (i, handle) in crates.iter().enumerate() {
                if let Some(body) = world.body(*handle) {
                    let (axis, angle) = body.rotation().to_axis_angle();
                    println!(
                        "  crate {}: position ({:6.2}, {:6.2}, {:6.2})  tilt {:5.1} deg about ({:.2}, {:.2}, {:.2})",
                        i,
                        body.position().x,
                        body.position().y,
                        body.position().z,
                        angle.to_degrees(),
                        axis.x,
                        axis.y,
                        axis.z
                    );
                }
            }
        }
    }

    println!("\nDone.");
    Ok(())
}
