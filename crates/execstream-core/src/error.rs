//! Error types for stream lifecycle operations.

use crate::types::DeviceId;

/// Errors from stream lifecycle operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// Stream creation failed on the native runtime.
    #[error("Failed to create stream on device {device}: {reason}")]
    CreationFailed {
        /// Device the creation was attempted on.
        device: DeviceId,
        /// Native runtime failure description.
        reason: String,
    },

    /// Stream synchronization failed.
    #[error("Stream synchronization failed: {0}")]
    SyncFailed(String),

    /// Stream destruction failed.
    #[error("Failed to destroy stream: {0}")]
    DestroyFailed(String),

    /// The native runtime is not available.
    #[error("Native runtime unavailable: {0}")]
    BackendUnavailable(String),
}

/// Result type for stream lifecycle operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::CreationFailed {
            device: DeviceId::new(2),
            reason: "out of resources".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create stream on device 2: out of resources"
        );

        let err = StreamError::SyncFailed("CUDA_ERROR_LAUNCH_FAILED".to_string());
        assert!(err.to_string().contains("synchronization failed"));

        let err = StreamError::BackendUnavailable("driver not installed".to_string());
        assert!(err.to_string().contains("driver not installed"));
    }
}
