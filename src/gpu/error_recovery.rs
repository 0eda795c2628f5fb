//! GPU error capture
//!
//! Validation errors raised while creating shaders and pipelines are caught
//! with error scopes and returned as [`OceanError::ShaderCompilation`], so a
//! broken program fails construction with its diagnostic instead of
//! surfacing later as an uncaptured error. Everything else lands in the
//! uncaptured-error handler, which logs it and latches device loss on
//! out-of-memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{OceanError, OceanResult};

/// Error capture for one device
pub struct GpuErrorRecovery {
    device: Arc<wgpu::Device>,
    device_lost: Arc<AtomicBool>,
}

impl GpuErrorRecovery {
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        let device_lost = Arc::new(AtomicBool::new(false));
        let device_lost_flag = device_lost.clone();

        device.on_uncaptured_error(Box::new(move |error| match error {
            wgpu::Error::OutOfMemory { .. } => {
                log::error!("[GpuErrorRecovery] GPU out of memory, marking device lost");
                device_lost_flag.store(true, Ordering::Relaxed);
            }
            wgpu::Error::Validation { description, .. } => {
                log::error!("[GpuErrorRecovery] GPU validation error: {}", description);
            }
        }));

        Self {
            device,
            device_lost,
        }
    }

    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::Relaxed)
    }

    /// Compile a WGSL module, returning the compiler diagnostic on failure
    pub fn create_shader(&self, label: &str, source: &str) -> OceanResult<wgpu::ShaderModule> {
        self.capture(label, || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
    }

    /// Create a compute pipeline with an explicit layout
    pub fn create_compute_pipeline(
        &self,
        label: &str,
        layouts: &[&wgpu::BindGroupLayout],
        module: &wgpu::ShaderModule,
        entry_point: &str,
    ) -> OceanResult<wgpu::ComputePipeline> {
        self.capture(label, || {
            let layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts: layouts,
                    push_constant_ranges: &[],
                });

            self.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(label),
                    layout: Some(&layout),
                    module,
                    entry_point,
                })
        })
    }

    /// Run `create` inside a validation error scope
    fn capture<R>(&self, label: &str, create: impl FnOnce() -> R) -> OceanResult<R> {
        if self.is_device_lost() {
            return Err(OceanError::GpuOperationFailed {
                operation: label.to_string(),
                error: "GPU device lost".to_string(),
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let resource = create();
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(resource),
            Some(error) => {
                log::error!("[GpuErrorRecovery::capture] {} failed: {}", label, error);
                Err(OceanError::ShaderCompilation {
                    shader: label.to_string(),
                    error: error.to_string(),
                })
            }
        }
    }
}
