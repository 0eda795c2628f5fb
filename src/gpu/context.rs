//! GPU device and queue shared by builders, fields and samplers

use std::sync::Arc;

use super::error_recovery::GpuErrorRecovery;
use crate::error::{OceanError, OceanResult};

/// Device, queue and error tracking for one GPU
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    recovery: GpuErrorRecovery,
}

impl GpuContext {
    /// Request a high-performance adapter and a device with default limits
    pub async fn new() -> OceanResult<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .ok_or(OceanError::DeviceNotFound)?;

        let info = adapter.get_info();
        log::info!(
            "[GpuContext::new] adapter '{}' ({:?}, {:?})",
            info.name,
            info.device_type,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ocean Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| OceanError::DeviceRequest(e.to_string()))?;

        Ok(Self::from_parts(Arc::new(device), Arc::new(queue)))
    }

    /// Blocking variant of [`GpuContext::new`]
    pub fn new_blocking() -> OceanResult<Self> {
        pollster::block_on(Self::new())
    }

    /// Wrap a device the host application already owns
    pub fn from_parts(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let recovery = GpuErrorRecovery::new(device.clone());
        Self {
            device,
            queue,
            recovery,
        }
    }

    pub fn recovery(&self) -> &GpuErrorRecovery {
        &self.recovery
    }

    /// Fail fast once the device has been reported lost
    pub fn ensure_alive(&self, operation: &str) -> OceanResult<()> {
        if self.recovery.is_device_lost() {
            return Err(OceanError::GpuOperationFailed {
                operation: operation.to_string(),
                error: "GPU device lost".to_string(),
            });
        }
        Ok(())
    }
}
