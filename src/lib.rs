// SPDX-License-Identifier: GPL-3.0-only

//! dscapture - capture pipeline for the DepthSense DS325
//!
//! This library drives a single DS325 sensor: it tracks device and node
//! hotplug, applies the fixed stream configuration to discovered depth and
//! color nodes, converts raw samples into fixed-layout pixel buffers, and
//! hands tear-free frame snapshots to consumer threads.
//!
//! # Architecture
//!
//! - [`capture::driver`]: trait seam over the sensor SDK's event loop
//! - `capture::lifecycle`: device/node state machine and configurator
//! - [`capture::convert`]: per-pixel depth and color conversion
//! - [`capture::stream`]: shared frame buffers with snapshot accessors
//! - [`capture::session`]: thread ownership, `start`/`stop` lifecycle
//!
//! # Example
//!
//! ```
//! use dscapture::{CaptureSession, StartOptions, VirtualSensor};
//!
//! let mut session = CaptureSession::new(VirtualSensor::new);
//! session.start(StartOptions::default()).unwrap();
//! let frame = session.depth_frame(); // zero-filled until a sample arrives
//! assert_eq!(frame.data.len(), dscapture::constants::DEPTH_PIXEL_COUNT);
//! session.stop().unwrap();
//! ```

pub mod capture;
pub mod constants;
pub mod errors;

// Re-export commonly used types
pub use capture::{
    CaptureSession, DepthMode, FrameSnapshot, SensorDriver, SensorEvent, StartOptions,
    StreamShape, VirtualSensor,
};
pub use errors::{CaptureError, CaptureResult, DriverError};
