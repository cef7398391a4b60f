//! Out-of-band reporting for teardown failures.
//!
//! Stream teardown runs inside `Drop`, where errors cannot be returned to a
//! caller and must never unwind. Failures on that path are packaged as
//! [`TeardownFault`]s and handed to a [`FaultSink`] instead: the default
//! [`TracingSink`] emits a structured error event, and [`MemorySink`] captures
//! faults for test assertions.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

use crate::error::StreamError;
use crate::types::{DeviceId, NativeStream};

/// Teardown stage at which a fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultStage {
    /// Draining the stream before release.
    Synchronize,
    /// Releasing the native resource.
    Release,
}

impl FaultStage {
    /// Returns the stage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synchronize => "synchronize",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure observed while tearing down a stream.
#[derive(Debug, Clone)]
pub struct TeardownFault {
    /// Stage at which the failure occurred.
    pub stage: FaultStage,
    /// Handle of the stream being torn down.
    pub stream: NativeStream,
    /// Device the stream was created on.
    pub device: DeviceId,
    /// The underlying runtime error.
    pub error: StreamError,
}

impl fmt::Display for TeardownFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "teardown {} fault on stream {} (device {}): {}",
            self.stage, self.stream, self.device, self.error
        )
    }
}

/// Destination for teardown faults.
///
/// `report` is called from drop paths and must not panic or block for long.
pub trait FaultSink: Send + Sync {
    /// Records a teardown fault.
    fn report(&self, fault: &TeardownFault);
}

/// Default sink that emits faults as `tracing` error events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl FaultSink for TracingSink {
    fn report(&self, fault: &TeardownFault) {
        tracing::error!(
            stage = fault.stage.as_str(),
            stream = %fault.stream,
            device = %fault.device,
            error = %fault.error,
            "Stream teardown fault"
        );
    }
}

/// In-memory fault sink for testing.
pub struct MemorySink {
    faults: Mutex<VecDeque<TeardownFault>>,
    max_faults: usize,
}

impl MemorySink {
    /// Creates a new memory sink keeping at most `max_faults` entries.
    pub fn new(max_faults: usize) -> Self {
        Self {
            faults: Mutex::new(VecDeque::with_capacity(max_faults)),
            max_faults,
        }
    }

    /// Returns all captured faults, oldest first.
    pub fn faults(&self) -> Vec<TeardownFault> {
        self.faults.lock().iter().cloned().collect()
    }

    /// Returns the number of captured faults.
    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    /// Returns true if no faults have been captured.
    pub fn is_empty(&self) -> bool {
        self.faults.lock().is_empty()
    }

    /// Discards all captured faults.
    pub fn clear(&self) {
        self.faults.lock().clear();
    }
}

impl FaultSink for MemorySink {
    fn report(&self, fault: &TeardownFault) {
        let mut faults = self.faults.lock();
        if faults.len() >= self.max_faults {
            faults.pop_front();
        }
        faults.push_back(fault.clone());
    }
}
