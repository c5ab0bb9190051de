// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture pipeline
//!
//! Driver-level failures are caught at the point of configuration and
//! converted to logged, non-fatal outcomes; no error ever terminates the
//! capture thread or surfaces to a consumer thread. Consumers see missing
//! data (zero-filled buffers, stale timestamps) instead of errors.

use std::fmt;

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors reported by the capture session
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// `start()` was called while a session is already running
    AlreadyRunning,
    /// `stop()` was called with no session running
    NotRunning,
    /// No sensor device was attached at enumeration time
    DeviceNotFound,
    /// Exclusive control or configuration application failed for a node
    Configuration(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::AlreadyRunning => write!(f, "capture session already running"),
            CaptureError::NotRunning => write!(f, "no capture session running"),
            CaptureError::DeviceNotFound => write!(f, "no sensor device attached"),
            CaptureError::Configuration(msg) => write!(f, "node configuration failed: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Errors raised by a [`SensorDriver`](crate::capture::driver::SensorDriver)
/// implementation
#[derive(Debug, Clone)]
pub enum DriverError {
    /// Exclusive control of a node was denied
    ControlDenied(String),
    /// The driver rejected the requested stream configuration
    ConfigRejected(String),
    /// Transport-level failure talking to the device
    Io(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::ControlDenied(msg) => write!(f, "control denied: {}", msg),
            DriverError::ConfigRejected(msg) => write!(f, "configuration rejected: {}", msg),
            DriverError::Io(msg) => write!(f, "driver I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<DriverError> for CaptureError {
    fn from(err: DriverError) -> Self {
        CaptureError::Configuration(err.to_string())
    }
}
