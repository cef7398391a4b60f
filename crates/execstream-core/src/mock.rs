//! Recording mock of the native runtime.
//!
//! [`MockRuntime`] implements [`StreamRuntime`] without touching any driver.
//! It hands out monotonically increasing handles, records every call in
//! submission order, and supports injecting failures per device or per
//! handle. Lifecycle tests assert ordering properties (synchronize before
//! destroy, exactly one destroy per stream) against the recorded calls.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{StreamError, StreamResult};
use crate::runtime::StreamRuntime;
use crate::types::{DeviceId, NativeStream};

/// A native runtime call observed by [`MockRuntime`], in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCall {
    /// `create_stream` was invoked for the device.
    Create(DeviceId),
    /// `synchronize` was invoked for the handle.
    Synchronize(NativeStream),
    /// `destroy_stream` was invoked for the handle.
    Destroy(NativeStream),
}

/// In-process stand-in for the native runtime.
pub struct MockRuntime {
    calls: Mutex<Vec<RuntimeCall>>,
    live: Mutex<HashSet<NativeStream>>,
    next_handle: AtomicUsize,
    fail_create: Mutex<HashSet<DeviceId>>,
    fail_sync: Mutex<HashSet<NativeStream>>,
    fail_destroy: Mutex<HashSet<NativeStream>>,
}

impl MockRuntime {
    /// Creates a mock runtime with no injected failures.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(HashSet::new()),
            // Handle 0 is the default-stream sentinel and never handed out
            next_handle: AtomicUsize::new(1),
            fail_create: Mutex::new(HashSet::new()),
            fail_sync: Mutex::new(HashSet::new()),
            fail_destroy: Mutex::new(HashSet::new()),
        }
    }

    /// Makes `create_stream` fail for the given device.
    pub fn fail_create_on(&self, device: DeviceId) {
        self.fail_create.lock().insert(device);
    }

    /// Makes `synchronize` fail for the given handle.
    pub fn fail_synchronize(&self, stream: NativeStream) {
        self.fail_sync.lock().insert(stream);
    }

    /// Makes `destroy_stream` fail for the given handle.
    pub fn fail_destroy(&self, stream: NativeStream) {
        self.fail_destroy.lock().insert(stream);
    }

    /// Returns all recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of streams created but not yet destroyed.
    pub fn live_streams(&self) -> usize {
        self.live.lock().len()
    }

    /// Discards the recorded calls. Injected failures are kept.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: RuntimeCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamRuntime for MockRuntime {
    fn create_stream(&self, device: DeviceId) -> StreamResult<NativeStream> {
        self.record(RuntimeCall::Create(device));

        if self.fail_create.lock().contains(&device) {
            return Err(StreamError::CreationFailed {
                device,
                reason: "injected creation failure".to_string(),
            });
        }

        let handle = NativeStream::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.live.lock().insert(handle);
        Ok(handle)
    }

    fn synchronize(&self, stream: NativeStream) -> StreamResult<()> {
        debug_assert!(
            !stream.is_default(),
            "default stream must not reach the native runtime"
        );
        self.record(RuntimeCall::Synchronize(stream));

        if self.fail_sync.lock().contains(&stream) {
            return Err(StreamError::SyncFailed(
                "injected synchronization failure".to_string(),
            ));
        }
        Ok(())
    }

    fn destroy_stream(&self, stream: NativeStream) -> StreamResult<()> {
        debug_assert!(
            !stream.is_default(),
            "default stream must not reach the native runtime"
        );
        self.record(RuntimeCall::Destroy(stream));
        self.live.lock().remove(&stream);

        if self.fail_destroy.lock().contains(&stream) {
            return Err(StreamError::DestroyFailed(
                "injected destroy failure".to_string(),
            ));
        }
        Ok(())
    }
}
