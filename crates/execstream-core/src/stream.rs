//! Shared-ownership execution streams and their lifecycle.
//!
//! A [`Stream`] is a cloneable owner of one native execution stream. Clones
//! share the underlying handle; when the last owner drops, the stream is
//! synchronized and then destroyed. Default stream instances are views of a
//! permanent driver resource and their drop does nothing.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use execstream_core::{DeviceId, StreamManager};
//! use execstream_cuda::CudaRuntime;
//!
//! let manager = StreamManager::new(Arc::new(CudaRuntime::new()?));
//! let stream = manager.create_on_device(DeviceId::new(0))?;
//!
//! submit_work(stream.native_handle().as_raw());
//! stream.synchronize()?;
//! drop(stream); // last owner: drain, then release
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::StreamResult;
use crate::fault::{FaultSink, FaultStage, TeardownFault, TracingSink};
use crate::runtime::StreamRuntime;
use crate::types::{DeviceId, NativeStream};

/// What a stream instance is bound to.
#[derive(Debug, Clone, Copy)]
enum Binding {
    /// View of the permanent default stream.
    Default,
    /// Exclusive owner of a created stream.
    Owned {
        handle: NativeStream,
        device: DeviceId,
    },
}

/// State shared by all clones of one [`Stream`].
///
/// The `Arc` wrapping this cell is the ownership count; its single `Drop`
/// run is the teardown path.
struct StreamInner {
    binding: Binding,
    runtime: Arc<dyn StreamRuntime>,
    faults: Arc<dyn FaultSink>,
}

impl Drop for StreamInner {
    fn drop(&mut self) {
        let (handle, device) = match self.binding {
            Binding::Default => return,
            Binding::Owned { handle, device } => (handle, device),
        };

        // Drain outstanding work before the handle is released. A failure
        // here goes to the fault sink; the release still proceeds.
        if let Err(error) = self.runtime.synchronize(handle) {
            self.faults.report(&TeardownFault {
                stage: FaultStage::Synchronize,
                stream: handle,
                device,
                error,
            });
        }

        if let Err(error) = self.runtime.destroy_stream(handle) {
            self.faults.report(&TeardownFault {
                stage: FaultStage::Release,
                stream: handle,
                device,
                error,
            });
        }

        tracing::debug!(stream = %handle, device = %device, "Released stream");
    }
}

/// A shared handle to one execution stream.
///
/// Cloning is cheap and shares the underlying native stream. The last clone
/// to drop tears the stream down: outstanding work is drained, then the
/// native resource is released. Work can only be enqueued through a live
/// `Stream`, so a handle in use is never torn down.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl Stream {
    /// Returns the native handle for submission-layer calls.
    ///
    /// The value is fixed for the lifetime of this instance and reading it
    /// never blocks. The raw value must not be retained beyond the `Stream`
    /// it was read from.
    #[must_use]
    pub fn native_handle(&self) -> NativeStream {
        match self.inner.binding {
            Binding::Default => NativeStream::DEFAULT,
            Binding::Owned { handle, .. } => handle,
        }
    }

    /// Returns true if this instance refers to the default stream.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self.inner.binding, Binding::Default)
    }

    /// Returns the device this stream was created on, or `None` for the
    /// default stream.
    #[must_use]
    pub fn device(&self) -> Option<DeviceId> {
        match self.inner.binding {
            Binding::Default => None,
            Binding::Owned { device, .. } => Some(device),
        }
    }

    /// Blocks until all work previously submitted to this stream completes.
    ///
    /// A no-op for default stream views: the lifecycle layer issues no
    /// native calls for the default stream.
    pub fn synchronize(&self) -> StreamResult<()> {
        match self.inner.binding {
            Binding::Default => Ok(()),
            Binding::Owned { handle, .. } => self.inner.runtime.synchronize(handle),
        }
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render the handle the way the log fields do ("default" or hex)
        f.debug_struct("Stream")
            .field("handle", &format_args!("{}", self.native_handle()))
            .field("device", &self.device())
            .finish()
    }
}

/// Factory for execution streams.
///
/// Holds the native runtime and the fault sink handed to every created
/// stream, plus one cached default stream instance. Streams carry their own
/// references to both, so they remain valid if the manager is dropped first.
pub struct StreamManager {
    runtime: Arc<dyn StreamRuntime>,
    faults: Arc<dyn FaultSink>,
    default_stream: Stream,
}

impl StreamManager {
    /// Creates a manager reporting teardown faults through [`TracingSink`].
    pub fn new(runtime: Arc<dyn StreamRuntime>) -> Self {
        Self::builder(runtime).build()
    }

    /// Returns a builder for configuring the manager.
    pub fn builder(runtime: Arc<dyn StreamRuntime>) -> StreamManagerBuilder {
        StreamManagerBuilder {
            runtime,
            faults: None,
        }
    }

    /// Returns a handle to the shared default stream instance.
    ///
    /// Never touches the native runtime and never fails.
    #[must_use]
    pub fn default_stream(&self) -> Stream {
        self.default_stream.clone()
    }

    /// Creates a fresh, unshared default stream view.
    ///
    /// Observationally the same as [`default_stream`](Self::default_stream);
    /// any number of default views may coexist.
    #[must_use]
    pub fn create_default(&self) -> Stream {
        Stream {
            inner: Arc::new(StreamInner {
                binding: Binding::Default,
                runtime: Arc::clone(&self.runtime),
                faults: Arc::clone(&self.faults),
            }),
        }
    }

    /// Creates a stream on the given device.
    ///
    /// On failure the native runtime's error is returned as
    /// [`StreamError::CreationFailed`](crate::error::StreamError::CreationFailed)
    /// and no stream object exists, so no teardown will run for it.
    pub fn create_on_device(&self, device: DeviceId) -> StreamResult<Stream> {
        let handle = self.runtime.create_stream(device)?;
        tracing::debug!(stream = %handle, device = %device, "Created stream");

        Ok(Stream {
            inner: Arc::new(StreamInner {
                binding: Binding::Owned { handle, device },
                runtime: Arc::clone(&self.runtime),
                faults: Arc::clone(&self.faults),
            }),
        })
    }
}

/// Builder for [`StreamManager`].
pub struct StreamManagerBuilder {
    runtime: Arc<dyn StreamRuntime>,
    faults: Option<Arc<dyn FaultSink>>,
}

impl StreamManagerBuilder {
    /// Sets the sink receiving teardown faults.
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.faults = Some(sink);
        self
    }

    /// Builds the manager.
    pub fn build(self) -> StreamManager {
        let faults = self
            .faults
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn FaultSink>);

        let default_stream = Stream {
            inner: Arc::new(StreamInner {
                binding: Binding::Default,
                runtime: Arc::clone(&self.runtime),
                faults: Arc::clone(&faults),
            }),
        };

        StreamManager {
            runtime: self.runtime,
            faults,
            default_stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::fault::MemorySink;
    use crate::mock::{MockRuntime, RuntimeCall};

    fn fixture() -> (Arc<MockRuntime>, StreamManager) {
        let mock = Arc::new(MockRuntime::new());
        let manager = StreamManager::new(mock.clone());
        (mock, manager)
    }

    #[test]
    fn test_created_stream_teardown_order() {
        let (mock, manager) = fixture();

        let stream = manager.create_on_device(DeviceId::new(0)).unwrap();
        let handle = stream.native_handle();
        assert!(!stream.is_default());
        assert_eq!(stream.device(), Some(DeviceId::new(0)));

        drop(stream);

        assert_eq!(
            mock.calls(),
            vec![
                RuntimeCall::Create(DeviceId::new(0)),
                RuntimeCall::Synchronize(handle),
                RuntimeCall::Destroy(handle),
            ]
        );
        assert_eq!(mock.live_streams(), 0);
    }

    #[test]
    fn test_clones_share_one_teardown() {
        let (mock, manager) = fixture();

        let stream = manager.create_on_device(DeviceId::new(0)).unwrap();
        let clone = stream.clone();
        assert_eq!(stream.native_handle(), clone.native_handle());

        drop(stream);
        // A surviving clone keeps the stream alive
        assert_eq!(mock.live_streams(), 1);

        drop(clone);
        let destroys = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, RuntimeCall::Destroy(_)))
            .count();
        assert_eq!(destroys, 1);
    }

    #[test]
    fn test_default_stream_is_sentinel() {
        let (mock, manager) = fixture();

        let default = manager.default_stream();
        assert!(default.is_default());
        assert_eq!(default.native_handle(), NativeStream::DEFAULT);
        assert_eq!(default.device(), None);

        let another = manager.create_default();
        assert!(another.is_default());

        drop(default);
        drop(another);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_default_synchronize_is_noop() {
        let (mock, manager) = fixture();

        manager.default_stream().synchronize().unwrap();
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_live_synchronize_propagates_errors() {
        let (mock, manager) = fixture();

        let stream = manager.create_on_device(DeviceId::new(0)).unwrap();
        stream.synchronize().unwrap();

        mock.fail_synchronize(stream.native_handle());
        assert!(matches!(
            stream.synchronize(),
            Err(StreamError::SyncFailed(_))
        ));
    }

    #[test]
    fn test_teardown_sync_fault_still_releases() {
        let mock = Arc::new(MockRuntime::new());
        let sink = Arc::new(MemorySink::new(8));
        let manager = StreamManager::builder(mock.clone())
            .with_fault_sink(sink.clone())
            .build();

        let stream = manager.create_on_device(DeviceId::new(0)).unwrap();
        let handle = stream.native_handle();
        mock.fail_synchronize(handle);

        drop(stream);

        let faults = sink.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].stage, FaultStage::Synchronize);
        assert_eq!(faults[0].stream, handle);
        assert!(mock.calls().contains(&RuntimeCall::Destroy(handle)));
    }

    #[test]
    fn test_default_built_manager_contains_teardown_faults() {
        // No sink configured: faults go to the tracing sink and the
        // release still runs.
        let (mock, manager) = fixture();

        let stream = manager.create_on_device(DeviceId::new(0)).unwrap();
        let handle = stream.native_handle();
        mock.fail_synchronize(handle);
        mock.fail_destroy(handle);

        drop(stream);

        assert!(mock.calls().contains(&RuntimeCall::Destroy(handle)));
        assert_eq!(mock.live_streams(), 0);
    }

    #[test]
    fn test_stream_debug_format() {
        let (_mock, manager) = fixture();

        let text = format!("{:?}", manager.default_stream());
        assert!(text.contains("default"));

        let stream = manager.create_on_device(DeviceId::new(3)).unwrap();
        let text = format!("{:?}", stream);
        assert!(text.contains(&stream.native_handle().to_string()));
        assert!(text.contains("DeviceId(3)"));
    }
}
