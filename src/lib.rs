// Ocean Field - FFT ocean surface with rigid-body buoyancy
//
// The ocean runs as a chain of wgpu compute passes (initial spectrum,
// time spectrum, butterfly IFFT, post-process). Samplers read the result
// back without stalling the frame, and the buoyancy layer turns sampled
// heights into forces on a small rigid-body world. A CPU reference field
// mirrors every GPU stage for headless use and testing.

// Core
pub mod config;
pub mod error;

// Numerics
pub mod fft;
pub mod math;

// GPU plumbing
pub mod gpu;

// Simulation
pub mod ocean;
pub mod physics;

pub use config::SimulationConfig;
pub use error::{ErrorContext, OceanError, OceanResult};
pub use gpu::GpuContext;
pub use ocean::{
    Cascade, CpuOceanField, CpuOceanFieldBuilder, FloatingBody, FloatingBodyOptions,
    InitialSpectrum, OceanField, OceanFieldBuilder, OceanFieldBuoyancy, OceanFieldOverrides,
    OceanFieldParams, OceanSurface, PatchSampling, Sample, SampleError, SampleStatus,
    WaveSampler,
};
pub use physics::{BodyHandle, RigidBody, World, WorldConfig};

// Re-export wgpu for hosts that share the device with a renderer
pub use wgpu;
