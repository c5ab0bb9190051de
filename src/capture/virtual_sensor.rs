// SPDX-License-Identifier: GPL-3.0-only

//! Virtual sensor driver
//!
//! A software implementation of [`SensorDriver`] that emulates a single
//! DS325: one device exposing a depth node, a color node, and an audio
//! node the pipeline ignores. Samples are paced at the configured frame
//! rate and carry animated test patterns, so the full pipeline can run
//! without hardware. Used by the demo binary and the integration tests.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use super::driver::{
    ColorConfig, DepthConfig, DeviceId, NodeId, NodeKind, SensorDriver, SensorEvent,
};
use crate::constants::{
    COLOR_BYTE_COUNT, COLOR_WIDTH, DEPTH_PIXEL_COUNT, DEPTH_SENTINEL, DEPTH_WIDTH,
};
use crate::errors::DriverError;

/// Device id of the emulated sensor
pub const VIRTUAL_DEVICE: DeviceId = 1;
/// Node id of the emulated depth stream
pub const VIRTUAL_DEPTH_NODE: NodeId = 10;
/// Node id of the emulated color stream
pub const VIRTUAL_COLOR_NODE: NodeId = 11;
/// Node id of the emulated audio stream (ignored by the pipeline)
pub const VIRTUAL_AUDIO_NODE: NodeId = 12;

/// Per-stream pacing state, live once the node is configured and started
struct PacedStream {
    node: NodeId,
    period: Duration,
    next_due: Option<Instant>,
    frame_index: u64,
}

impl PacedStream {
    fn new(node: NodeId, framerate: u32) -> Self {
        Self {
            node,
            period: Duration::from_micros(1_000_000 / u64::from(framerate.max(1))),
            next_due: None,
            frame_index: 0,
        }
    }
}

/// Emulated DS325 context
pub struct VirtualSensor {
    /// Hotplug events delivered ahead of any samples
    pending: VecDeque<SensorEvent>,
    /// True when the device shows up in startup enumeration
    pre_attached: bool,
    epoch: Instant,
    started: bool,
    registered: Vec<NodeId>,
    depth: Option<PacedStream>,
    color: Option<PacedStream>,
}

impl VirtualSensor {
    /// Sensor already plugged in when the context is created; discovered
    /// via startup enumeration.
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            pre_attached: true,
            epoch: Instant::now(),
            started: false,
            registered: Vec::new(),
            depth: None,
            color: None,
        }
    }

    /// Sensor plugged in after the event loop starts; discovered via
    /// hotplug events instead of enumeration.
    pub fn hotplug() -> Self {
        let mut sensor = Self::new();
        sensor.pre_attached = false;
        sensor.pending = VecDeque::from([
            SensorEvent::DeviceAttached(VIRTUAL_DEVICE),
            SensorEvent::NodeAttached {
                device: VIRTUAL_DEVICE,
                node: VIRTUAL_DEPTH_NODE,
                kind: NodeKind::Depth,
            },
            SensorEvent::NodeAttached {
                device: VIRTUAL_DEVICE,
                node: VIRTUAL_COLOR_NODE,
                kind: NodeKind::Color,
            },
            SensorEvent::NodeAttached {
                device: VIRTUAL_DEVICE,
                node: VIRTUAL_AUDIO_NODE,
                kind: NodeKind::Other,
            },
        ]);
        sensor
    }

    fn timestamp_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    /// The stream (if any) whose next sample is due soonest
    fn earliest_due(&self) -> Option<(NodeId, Instant)> {
        let mut earliest: Option<(NodeId, Instant)> = None;
        for stream in [self.depth.as_ref(), self.color.as_ref()].into_iter().flatten() {
            if !self.registered.contains(&stream.node) {
                continue;
            }
            if let Some(due) = stream.next_due
                && earliest.is_none_or(|(_, t)| due < t)
            {
                earliest = Some((stream.node, due));
            }
        }
        earliest
    }

    fn emit_sample(&mut self, node: NodeId) -> SensorEvent {
        let timestamp_us = self.timestamp_us();
        if node == VIRTUAL_DEPTH_NODE {
            let stream = self.depth.as_mut().expect("depth stream configured");
            stream.next_due = Some(stream.next_due.unwrap_or_else(Instant::now) + stream.period);
            let frame = depth_pattern(stream.frame_index);
            stream.frame_index += 1;
            SensorEvent::DepthSample {
                node,
                depth: frame,
                timestamp_us,
            }
        } else {
            let stream = self.color.as_mut().expect("color stream configured");
            stream.next_due = Some(stream.next_due.unwrap_or_else(Instant::now) + stream.period);
            let frame = color_pattern(stream.frame_index);
            stream.frame_index += 1;
            SensorEvent::ColorSample {
                node,
                rgb: frame,
                timestamp_us,
            }
        }
    }
}

impl Default for VirtualSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for VirtualSensor {
    fn devices(&mut self) -> Vec<DeviceId> {
        if self.pre_attached {
            vec![VIRTUAL_DEVICE]
        } else {
            Vec::new()
        }
    }

    fn device_nodes(&mut self, device: DeviceId) -> Vec<(NodeId, NodeKind)> {
        if device == VIRTUAL_DEVICE {
            vec![
                (VIRTUAL_DEPTH_NODE, NodeKind::Depth),
                (VIRTUAL_COLOR_NODE, NodeKind::Color),
                (VIRTUAL_AUDIO_NODE, NodeKind::Other),
            ]
        } else {
            Vec::new()
        }
    }

    fn request_control(&mut self, _node: NodeId) -> Result<(), DriverError> {
        Ok(())
    }

    fn apply_depth_config(
        &mut self,
        node: NodeId,
        config: &DepthConfig,
    ) -> Result<(), DriverError> {
        if node != VIRTUAL_DEPTH_NODE {
            return Err(DriverError::ConfigRejected(format!(
                "node {} is not a depth node",
                node
            )));
        }
        debug!(rate = config.framerate, mode = ?config.mode, "virtual depth node configured");
        self.depth = Some(PacedStream::new(node, config.framerate));
        Ok(())
    }

    fn apply_color_config(
        &mut self,
        node: NodeId,
        config: &ColorConfig,
    ) -> Result<(), DriverError> {
        if node != VIRTUAL_COLOR_NODE {
            return Err(DriverError::ConfigRejected(format!(
                "node {} is not a color node",
                node
            )));
        }
        self.color = Some(PacedStream::new(node, config.framerate()));
        Ok(())
    }

    fn register_node(&mut self, node: NodeId) {
        if !self.registered.contains(&node) {
            self.registered.push(node);
        }
    }

    fn unregister_node(&mut self, node: NodeId) {
        self.registered.retain(|&n| n != node);
    }

    fn start_nodes(&mut self) {
        self.started = true;
        let now = Instant::now();
        for stream in [self.depth.as_mut(), self.color.as_mut()].into_iter().flatten() {
            stream.next_due = Some(now + stream.period);
        }
    }

    fn stop_nodes(&mut self) {
        self.started = false;
        for stream in [self.depth.as_mut(), self.color.as_mut()].into_iter().flatten() {
            stream.next_due = None;
        }
    }

    fn poll_event(&mut self, timeout: Duration) -> Option<SensorEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        if !self.started {
            std::thread::sleep(timeout);
            return None;
        }

        let deadline = Instant::now() + timeout;
        loop {
            match self.earliest_due() {
                Some((node, due)) => {
                    let now = Instant::now();
                    if due <= now {
                        // Streams configured after start_nodes begin pacing
                        // on their first due check
                        return Some(self.emit_sample(node));
                    }
                    if due >= deadline {
                        std::thread::sleep(deadline.saturating_duration_since(now));
                        return None;
                    }
                    std::thread::sleep(due - now);
                }
                None => {
                    std::thread::sleep(timeout);
                    return None;
                }
            }
        }
    }
}

/// Depth test pattern: a horizontal ramp over the usable range with a
/// slowly advancing oversaturated band, so converted frames exercise both
/// the log mapping and the sentinel path.
fn depth_pattern(frame_index: u64) -> Vec<u16> {
    let mut frame = vec![0u16; DEPTH_PIXEL_COUNT];
    let band_start = ((frame_index * 8) % u64::from(DEPTH_WIDTH)) as usize;
    for (i, value) in frame.iter_mut().enumerate() {
        let x = i % DEPTH_WIDTH as usize;
        *value = if x >= band_start && x < band_start + 16 {
            DEPTH_SENTINEL
        } else {
            (x * 31_000 / DEPTH_WIDTH as usize) as u16 + 500
        };
    }
    frame
}

/// Color test pattern: axis-aligned gradients with a rolling blue channel
fn color_pattern(frame_index: u64) -> Vec<u8> {
    let mut frame = vec![0u8; COLOR_BYTE_COUNT];
    let roll = (frame_index % 256) as u8;
    for (i, px) in frame.chunks_exact_mut(3).enumerate() {
        let x = i % COLOR_WIDTH as usize;
        let y = i / COLOR_WIDTH as usize;
        px[0] = (x * 255 / COLOR_WIDTH as usize) as u8;
        px[1] = (y * 255 / crate::constants::COLOR_HEIGHT as usize) as u8;
        px[2] = roll;
    }
    frame
}
