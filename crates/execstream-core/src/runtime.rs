//! Native runtime abstraction.
//!
//! The lifecycle layer consumes the underlying driver through exactly three
//! primitives: allocate a stream on a device, block until a stream drains,
//! and release a stream. Everything else (device enumeration, work
//! submission, memory) belongs to neighbouring subsystems. Keeping the
//! surface this narrow lets tests substitute a recording mock and keeps the
//! core free of driver bindings.

use crate::error::StreamResult;
use crate::types::{DeviceId, NativeStream};

/// The native runtime's stream primitives.
///
/// Implementations are shared across threads as `Arc<dyn StreamRuntime>` and
/// must be safe to call concurrently. The lifecycle core never passes
/// [`NativeStream::DEFAULT`] to any of these methods; the default stream is
/// handled entirely above this boundary.
///
/// Implementations must not panic: [`synchronize`](StreamRuntime::synchronize)
/// and [`destroy_stream`](StreamRuntime::destroy_stream) are invoked from drop
/// paths where a panic would abort the process.
pub trait StreamRuntime: Send + Sync {
    /// Allocates a fresh stream on the given device.
    ///
    /// The returned handle is non-default and exclusively owned by the
    /// caller. Callers must ensure the device is usable from the current
    /// thread; implementations may bind the device context themselves.
    fn create_stream(&self, device: DeviceId) -> StreamResult<NativeStream>;

    /// Blocks until all work previously submitted to the stream completes.
    ///
    /// Returns an error if any of the drained work faulted.
    fn synchronize(&self, stream: NativeStream) -> StreamResult<()>;

    /// Releases the native stream resource.
    ///
    /// The handle is invalid after this call returns, whether or not it
    /// returns an error.
    fn destroy_stream(&self, stream: NativeStream) -> StreamResult<()>;
}
