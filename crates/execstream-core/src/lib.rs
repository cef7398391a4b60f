//! # ExecStream Core
//!
//! Backend-agnostic lifecycle management for GPU execution streams.
//!
//! An execution stream is an ordered command queue on a device. This crate
//! owns the lifecycle around such streams: creation through a narrow native
//! runtime abstraction, shared reference-counted ownership, a distinguished
//! default stream that is never created or destroyed, and teardown that
//! drains the stream before releasing it.
//!
//! ## Core Abstractions
//!
//! - [`Stream`] - Cloneable shared owner of one native stream
//! - [`StreamManager`] - Factory for default and device streams
//! - [`StreamRuntime`] - The native runtime reduced to three primitives
//! - [`FaultSink`] - Out-of-band channel for teardown failures
//! - [`MockRuntime`] - Recording runtime for lifecycle tests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use execstream_core::prelude::*;
//!
//! let manager = StreamManager::new(runtime);
//! let stream = manager.create_on_device(DeviceId::new(0))?;
//! let handle = stream.native_handle();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fault;
pub mod mock;
pub mod runtime;
pub mod stream;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{StreamError, StreamResult};
    pub use crate::fault::{FaultSink, FaultStage, MemorySink, TeardownFault, TracingSink};
    pub use crate::mock::{MockRuntime, RuntimeCall};
    pub use crate::runtime::StreamRuntime;
    pub use crate::stream::{Stream, StreamManager, StreamManagerBuilder};
    pub use crate::types::{DeviceId, NativeStream};
}

// Re-exports for convenience
pub use error::{StreamError, StreamResult};
pub use fault::{FaultSink, FaultStage, MemorySink, TeardownFault, TracingSink};
pub use mock::{MockRuntime, RuntimeCall};
pub use runtime::StreamRuntime;
pub use stream::{Stream, StreamManager, StreamManagerBuilder};
pub use types::{DeviceId, NativeStream};
