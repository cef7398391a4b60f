//! CUDA backend for ExecStream
//!
//! This crate implements the `execstream-core` native runtime abstraction on
//! top of the CUDA driver API using cudarc.
//!
//! # Requirements
//!
//! - NVIDIA GPU and driver
//! - Build with the `cuda` feature; without it a stub runtime is provided
//!   whose constructor reports the backend as unavailable
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use execstream_core::{DeviceId, StreamManager};
//! use execstream_cuda::CudaRuntime;
//!
//! let runtime = Arc::new(CudaRuntime::new()?);
//! let manager = StreamManager::new(runtime);
//! let stream = manager.create_on_device(DeviceId::new(0))?;
//! ```

#![warn(missing_docs)]

#[cfg(feature = "cuda")]
mod runtime;

#[cfg(feature = "cuda")]
pub use runtime::CudaRuntime;

// Placeholder implementation when CUDA is not available
#[cfg(not(feature = "cuda"))]
mod stub {
    use execstream_core::error::{StreamError, StreamResult};
    use execstream_core::runtime::StreamRuntime;
    use execstream_core::types::{DeviceId, NativeStream};

    /// Stub CUDA runtime when the `cuda` feature is disabled.
    #[derive(Debug)]
    pub struct CudaRuntime;

    impl CudaRuntime {
        /// Create fails when CUDA is not available.
        pub fn new() -> StreamResult<Self> {
            Err(StreamError::BackendUnavailable(
                "CUDA feature not enabled".to_string(),
            ))
        }
    }

    impl StreamRuntime for CudaRuntime {
        fn create_stream(&self, device: DeviceId) -> StreamResult<NativeStream> {
            Err(StreamError::CreationFailed {
                device,
                reason: "CUDA feature not enabled".to_string(),
            })
        }

        fn synchronize(&self, _stream: NativeStream) -> StreamResult<()> {
            Err(StreamError::BackendUnavailable(
                "CUDA feature not enabled".to_string(),
            ))
        }

        fn destroy_stream(&self, _stream: NativeStream) -> StreamResult<()> {
            Err(StreamError::BackendUnavailable(
                "CUDA feature not enabled".to_string(),
            ))
        }
    }
}

#[cfg(not(feature = "cuda"))]
pub use stub::CudaRuntime;

/// Check if CUDA is available at runtime.
///
/// This function returns false if:
/// - the `cuda` feature is not enabled
/// - CUDA libraries are not installed on the system
/// - no CUDA devices are present
///
/// It safely catches panics from cudarc when CUDA is not installed.
pub fn is_cuda_available() -> bool {
    #[cfg(feature = "cuda")]
    {
        // cudarc panics if CUDA libraries are not found, so we catch that
        std::panic::catch_unwind(|| {
            cudarc::driver::CudaContext::device_count()
                .map(|c| c > 0)
                .unwrap_or(false)
        })
        .unwrap_or(false)
    }
    #[cfg(not(feature = "cuda"))]
    {
        false
    }
}

/// Get CUDA device count.
///
/// Returns 0 if CUDA is not available or libraries are not installed.
pub fn cuda_device_count() -> usize {
    #[cfg(feature = "cuda")]
    {
        // cudarc panics if CUDA libraries are not found, so we catch that
        std::panic::catch_unwind(|| {
            cudarc::driver::CudaContext::device_count().unwrap_or(0) as usize
        })
        .unwrap_or(0)
    }
    #[cfg(not(feature = "cuda"))]
    {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_probe_does_not_panic() {
        let available = is_cuda_available();
        let count = cuda_device_count();
        if available {
            assert!(count > 0);
        }
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_stub_runtime_reports_unavailable() {
        use execstream_core::error::StreamError;

        let err = CudaRuntime::new().unwrap_err();
        assert!(matches!(err, StreamError::BackendUnavailable(_)));
        assert_eq!(format!("{:?}", CudaRuntime), "CudaRuntime");
        assert!(!is_cuda_available());
        assert_eq!(cuda_device_count(), 0);
    }
}
