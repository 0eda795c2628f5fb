//! Error handling for the ocean simulation
//!
//! Every fallible operation in the crate returns [`OceanResult`]. GPU
//! construction failures carry the driver/compiler diagnostic so callers
//! see why a field could not be built.

use crate::ocean::sampler::SampleError;

/// Main error type for the ocean simulation
#[derive(Debug, thiserror::Error)]
pub enum OceanError {
    #[error("Invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No compatible GPU adapter found")]
    DeviceNotFound,

    #[error("GPU device request failed: {0}")]
    DeviceRequest(String),

    #[error("Shader compilation failed for {shader}: {error}")]
    ShaderCompilation { shader: String, error: String },

    #[error("GPU operation '{operation}' failed: {error}")]
    GpuOperationFailed { operation: String, error: String },

    #[error("Buffer error during {operation}: {error}")]
    BufferError { operation: String, error: String },

    #[error("Failed to load config from {path}: {error}")]
    ConfigLoad { path: String, error: String },

    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Result type alias for ocean operations
pub type OceanResult<T> = Result<T, OceanError>;

impl OceanError {
    /// Shorthand for configuration validation failures
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        OceanError::InvalidConfig {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Extension trait for attaching a GPU operation label to foreign errors
pub trait ErrorContext<T> {
    fn gpu_context(self, operation: &str) -> OceanResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn gpu_context(self, operation: &str) -> OceanResult<T> {
        self.map_err(|e| OceanError::GpuOperationFailed {
            operation: operation.to_string(),
            error: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OceanError::invalid_config("resolution", 100, "must be a power of two");
        assert_eq!(
            err.to_string(),
            "Invalid config: resolution = 100 (must be a power of two)"
        );
    }

    #[test]
    fn test_gpu_context() {
        let result: Result<(), String> = Err("mapping rejected".to_string());
        let err = result.gpu_context("readback").unwrap_err();
        match err {
            OceanError::GpuOperationFailed { operation, error } => {
                assert_eq!(operation, "readback");
                assert_eq!(error, "mapping rejected");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sample_error_conversion() {
        let err: OceanError = SampleError::NotReady.into();
        assert!(matches!(err, OceanError::Sample(SampleError::NotReady)));
    }
}
