//! CUDA driver implementation of the stream primitives.
//!
//! Streams are created through the raw driver API (`cuStreamCreate`) rather
//! than cudarc's owned stream type: ownership and teardown ordering live in
//! `execstream-core`, so this layer must hand back a bare handle instead of
//! an object with its own drop semantics. Per-device primary contexts are
//! retained for the lifetime of the runtime so handles stay valid while any
//! stream exists.

use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::Arc;

use cudarc::driver::sys as cuda_sys;
use cudarc::driver::CudaContext;
use parking_lot::RwLock;

use execstream_core::error::{StreamError, StreamResult};
use execstream_core::runtime::StreamRuntime;
use execstream_core::types::{DeviceId, NativeStream};

/// [`StreamRuntime`] backed by the CUDA driver.
pub struct CudaRuntime {
    /// Primary contexts retained per device ordinal.
    contexts: RwLock<HashMap<usize, Arc<CudaContext>>>,
}

impl CudaRuntime {
    /// Creates the runtime, probing for a usable CUDA installation.
    ///
    /// Device contexts are initialized lazily on first stream creation per
    /// device.
    pub fn new() -> StreamResult<Self> {
        if !crate::is_cuda_available() {
            return Err(StreamError::BackendUnavailable(
                "no CUDA driver or device detected".to_string(),
            ));
        }

        tracing::info!(
            devices = crate::cuda_device_count(),
            "Initialized CUDA stream runtime"
        );

        Ok(Self {
            contexts: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the retained context for a device, initializing it on first use.
    fn context(&self, device: DeviceId) -> StreamResult<Arc<CudaContext>> {
        if let Some(ctx) = self.contexts.read().get(&device.index()) {
            return Ok(Arc::clone(ctx));
        }

        let ctx = CudaContext::new(device.index()).map_err(|e| StreamError::CreationFailed {
            device,
            reason: format!("failed to initialize device context: {}", e),
        })?;

        let mut contexts = self.contexts.write();
        // Another thread may have won the race; keep the first context
        Ok(Arc::clone(contexts.entry(device.index()).or_insert(ctx)))
    }
}

impl fmt::Debug for CudaRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaRuntime")
            .field("initialized_devices", &self.contexts.read().len())
            .finish()
    }
}

impl StreamRuntime for CudaRuntime {
    fn create_stream(&self, device: DeviceId) -> StreamResult<NativeStream> {
        let ctx = self.context(device)?;
        ctx.bind_to_thread()
            .map_err(|e| StreamError::CreationFailed {
                device,
                reason: format!("failed to bind device context: {}", e),
            })?;

        let mut raw: cuda_sys::CUstream = ptr::null_mut();
        let flags = cuda_sys::CUstream_flags::CU_STREAM_DEFAULT as u32;

        // Safety: the device's context is bound to this thread and `raw`
        // receives the new handle
        unsafe {
            let result = cuda_sys::cuStreamCreate(&mut raw, flags);

            if result != cuda_sys::CUresult::CUDA_SUCCESS {
                return Err(StreamError::CreationFailed {
                    device,
                    reason: format!("cuStreamCreate failed: {:?}", result),
                });
            }
        }

        let handle = NativeStream::from_raw(raw as usize);
        tracing::debug!(stream = %handle, device = %device, "Created CUDA stream");
        Ok(handle)
    }

    fn synchronize(&self, stream: NativeStream) -> StreamResult<()> {
        debug_assert!(!stream.is_default());

        // Safety: the handle came from create_stream and has not been
        // destroyed; the driver resolves its owning context from the handle
        unsafe {
            let result = cuda_sys::cuStreamSynchronize(stream.as_raw() as cuda_sys::CUstream);

            if result != cuda_sys::CUresult::CUDA_SUCCESS {
                return Err(StreamError::SyncFailed(format!(
                    "cuStreamSynchronize failed: {:?}",
                    result
                )));
            }
        }
        Ok(())
    }

    fn destroy_stream(&self, stream: NativeStream) -> StreamResult<()> {
        debug_assert!(!stream.is_default());

        // Safety: the handle came from create_stream; after this call it is
        // invalid and never used again
        unsafe {
            let result = cuda_sys::cuStreamDestroy_v2(stream.as_raw() as cuda_sys::CUstream);

            if result != cuda_sys::CUresult::CUDA_SUCCESS {
                return Err(StreamError::DestroyFailed(format!(
                    "cuStreamDestroy failed: {:?}",
                    result
                )));
            }
        }

        tracing::debug!(stream = %stream, "Destroyed CUDA stream");
        Ok(())
    }
}
