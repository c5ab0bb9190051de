// SPDX-License-Identifier: GPL-3.0-only

//! DS325 capture pipeline
//!
//! # Architecture
//!
//! ```text
//! SensorDriver events (capture thread)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Lifecycle        │  ← device/node hotplug state machine,
//! │ state machine    │    configures nodes exactly once
//! └──────────────────┘
//!        │ samples
//!        ▼
//! ┌──────────────────┐
//! │ Converters       │  ← depth log compression / RGB passthrough
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ SharedStream     │  ← mutex-guarded buffer + timestamp + sequence
//! └──────────────────┘
//!        │ snapshot()
//!        ▼
//!   Consumer threads (renderer, bindings, ...)
//! ```
//!
//! [`CaptureSession`] owns the capture thread and the stream buffers;
//! everything device-shaped happens on that thread.

pub mod convert;
pub mod driver;
mod lifecycle;
pub mod session;
pub mod stream;
pub mod virtual_sensor;

pub use driver::{
    ColorConfig, Compression, DepthConfig, DepthMode, DeviceId, NodeId, NodeKind,
    PowerLineFrequency, SensorDriver, SensorEvent,
};
pub use session::{CaptureSession, StartOptions};
pub use stream::{FrameSnapshot, StreamShape};
pub use virtual_sensor::VirtualSensor;
