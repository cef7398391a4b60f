//! Handle and identifier types shared across the stream lifecycle layer.

use std::fmt;

/// An opaque native stream handle.
///
/// The native runtime hands these out as raw pointers; they are carried here
/// as pointer-sized integers so the handle stays `Copy` and FFI-compatible
/// without tying the core to any particular driver binding. The zero value is
/// reserved for the default stream and is never produced by stream creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeStream(usize);

impl NativeStream {
    /// The default (null) stream handle.
    ///
    /// This is the driver's implicit queue. It exists for the lifetime of the
    /// device context and is never created or destroyed by this crate.
    pub const DEFAULT: NativeStream = NativeStream(0);

    /// Wraps a raw handle value obtained from the native runtime.
    #[must_use]
    pub fn from_raw(raw: usize) -> Self {
        NativeStream(raw)
    }

    /// Returns the raw handle value for submission-layer FFI calls.
    #[must_use]
    pub fn as_raw(self) -> usize {
        self.0
    }

    /// Returns true if this is the default (null) stream.
    #[must_use]
    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NativeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "default")
        } else {
            write!(f, "0x{:x}", self.0)
        }
    }
}

/// Identifier of a device supplied by the device-management layer.
///
/// Wraps the device ordinal. Device enumeration and selection live outside
/// this crate; the lifecycle layer only forwards the ordinal to the native
/// runtime when creating streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(usize);

impl DeviceId {
    /// Creates a device identifier from an ordinal.
    #[must_use]
    pub fn new(ordinal: usize) -> Self {
        DeviceId(ordinal)
    }

    /// Returns the device ordinal.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_sentinel() {
        assert!(NativeStream::DEFAULT.is_default());
        assert_eq!(NativeStream::DEFAULT.as_raw(), 0);
        assert_eq!(NativeStream::from_raw(0), NativeStream::DEFAULT);
    }

    #[test]
    fn test_non_default_handle() {
        let handle = NativeStream::from_raw(0x7f00_dead_beef);
        assert!(!handle.is_default());
        assert_eq!(handle.as_raw(), 0x7f00_dead_beef);
        assert_ne!(handle, NativeStream::DEFAULT);
    }

    #[test]
    fn test_stream_display() {
        assert_eq!(NativeStream::DEFAULT.to_string(), "default");
        assert_eq!(NativeStream::from_raw(0xab).to_string(), "0xab");
    }

    #[test]
    fn test_device_id() {
        let device = DeviceId::new(3);
        assert_eq!(device.index(), 3);
        assert_eq!(device.to_string(), "3");
        assert_eq!(device, DeviceId::new(3));
        assert_ne!(device, DeviceId::new(4));
    }
}
