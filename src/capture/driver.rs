// SPDX-License-Identifier: GPL-3.0-only

//! Sensor driver abstraction
//!
//! The DepthSense SDK is event driven: lifecycle and per-sample callbacks
//! fire from driver activity, not from caller code. This module flattens
//! that into a polled interface so the capture thread owns the loop and can
//! observe its stop flag between events. A binding over the real SDK
//! implements [`SensorDriver`]; tests and the demo binary use the
//! [`VirtualSensor`](super::virtual_sensor::VirtualSensor) implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DriverError;

/// Opaque identity handle for a physical sensor device
pub type DeviceId = u32;

/// Opaque identity handle for a stream endpoint exposed by a device
pub type NodeId = u32;

/// Kind of stream endpoint a node exposes
///
/// The DS325 also exposes an audio node; anything that is not depth or
/// color is `Other` and the lifecycle machine ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Depth,
    Color,
    Other,
}

/// Depth camera operating mode, passed through to the driver unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthMode {
    /// Optimized for short-range accuracy
    #[default]
    Close,
    /// Optimized for long-range readings
    LongRange,
}

/// Color stream compression applied by the device ISP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    Mjpeg,
    Yuy2,
}

/// Power-line frequency hint for the color sensor's flicker compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerLineFrequency {
    Disabled,
    #[default]
    Hz50,
    Hz60,
}

/// Configuration applied to a depth node, exactly once per node instance
///
/// Frame format is fixed at QVGA and not part of the config surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthConfig {
    /// Target frame rate in Hz
    pub framerate: u32,
    /// Camera operating mode
    pub mode: DepthMode,
    /// Report oversaturated pixels with the sentinel value instead of
    /// dropping them
    pub saturation: bool,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            framerate: crate::constants::DEFAULT_FRAME_RATE_HZ,
            mode: DepthMode::Close,
            saturation: true,
        }
    }
}

/// Configuration applied to a color node, exactly once per node instance
///
/// Frame format is fixed at VGA; compression and power-line frequency are
/// fixed defaults rather than caller-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorConfig {
    pub compression: Compression,
    pub power_line_frequency: PowerLineFrequency,
}

impl ColorConfig {
    /// Target frame rate in Hz (matches the default depth rate)
    pub fn framerate(&self) -> u32 {
        crate::constants::DEFAULT_FRAME_RATE_HZ
    }
}

/// Event delivered by the driver to the capture thread
///
/// Sample timestamps are in microseconds of device capture time
/// (`timeOfCapture` units), monotonic non-decreasing per stream.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    DeviceAttached(DeviceId),
    DeviceDetached(DeviceId),
    NodeAttached {
        device: DeviceId,
        node: NodeId,
        kind: NodeKind,
    },
    NodeDetached {
        device: DeviceId,
        node: NodeId,
    },
    DepthSample {
        node: NodeId,
        depth: Vec<u16>,
        timestamp_us: u64,
    },
    ColorSample {
        node: NodeId,
        rgb: Vec<u8>,
        timestamp_us: u64,
    },
}

/// Interface to the sensor driver/context
///
/// All methods are called from the capture thread only. `poll_event` may
/// block up to `timeout` waiting for driver activity; everything else is
/// expected to return promptly.
pub trait SensorDriver: Send {
    /// Devices already attached when the context was created
    fn devices(&mut self) -> Vec<DeviceId>;

    /// Nodes already present on an attached device
    fn device_nodes(&mut self, device: DeviceId) -> Vec<(NodeId, NodeKind)>;

    /// Request exclusive control of a node from the owning context
    fn request_control(&mut self, node: NodeId) -> Result<(), DriverError>;

    /// Apply depth stream configuration and enable depth map output
    fn apply_depth_config(&mut self, node: NodeId, config: &DepthConfig) -> Result<(), DriverError>;

    /// Apply color stream configuration and enable color map output
    fn apply_color_config(&mut self, node: NodeId, config: &ColorConfig) -> Result<(), DriverError>;

    /// Add a node to the context's active set
    fn register_node(&mut self, node: NodeId);

    /// Remove a node from the context's active set
    fn unregister_node(&mut self, node: NodeId);

    /// Begin sample delivery for all registered nodes
    fn start_nodes(&mut self);

    /// Halt sample delivery
    fn stop_nodes(&mut self);

    /// Wait up to `timeout` for the next driver event
    fn poll_event(&mut self, timeout: Duration) -> Option<SensorEvent>;
}
