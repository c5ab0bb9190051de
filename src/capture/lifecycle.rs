// SPDX-License-Identifier: GPL-3.0-only

//! Device/node lifecycle state machine and node configurator
//!
//! Runs entirely on the capture thread: the driver delivers lifecycle and
//! sample events sequentially, and this machine tracks the single managed
//! device, configures depth/color nodes exactly once per node instance,
//! and routes accepted samples through the converters into the shared
//! streams.
//!
//! Configuration failures are non-fatal. The node keeps its slot and is
//! still registered with the context (matching observed DS325 driver
//! usage; see DESIGN.md), but no frame buffer is allocated, so consumers
//! keep seeing zero-filled frames for that stream.

use tracing::{debug, info, warn};

use super::convert;
use super::driver::{ColorConfig, DepthConfig, DeviceId, NodeId, NodeKind, SensorDriver, SensorEvent};
use super::session::StartOptions;
use super::stream::SharedStream;
use crate::constants::{COLOR_BYTE_COUNT, DEPTH_PIXEL_COUNT};
use crate::errors::{CaptureError, DriverError};

pub(crate) struct Lifecycle {
    options: StartOptions,
    /// The single tracked device; presence doubles as the device-found flag
    device: Option<DeviceId>,
    depth_node: Option<NodeId>,
    color_node: Option<NodeId>,
    depth: SharedStream,
    color: SharedStream,
    /// Reused conversion target so the stream lock is held only for the copy
    depth_scratch: Vec<u8>,
}

impl Lifecycle {
    pub(crate) fn new(options: StartOptions, depth: SharedStream, color: SharedStream) -> Self {
        Self {
            options,
            device: None,
            depth_node: None,
            color_node: None,
            depth,
            color,
            depth_scratch: vec![0u8; DEPTH_PIXEL_COUNT],
        }
    }

    /// Replay devices and nodes that were already attached before the event
    /// loop begins, through the same paths hotplug events take. Only the
    /// first device is adopted.
    pub(crate) fn enumerate(&mut self, driver: &mut dyn SensorDriver) {
        let devices = driver.devices();
        let Some(&first) = devices.first() else {
            warn!("{}", CaptureError::DeviceNotFound);
            return;
        };
        self.device = Some(first);

        let nodes = driver.device_nodes(first);
        info!(device = first, count = nodes.len(), "found nodes");
        for (node, kind) in nodes {
            self.node_attached(driver, first, node, kind);
        }
    }

    pub(crate) fn handle_event(&mut self, driver: &mut dyn SensorDriver, event: SensorEvent) {
        match event {
            SensorEvent::DeviceAttached(device) => self.device_attached(device),
            SensorEvent::DeviceDetached(device) => self.device_detached(device),
            SensorEvent::NodeAttached { device, node, kind } => {
                self.node_attached(driver, device, node, kind);
            }
            SensorEvent::NodeDetached { node, .. } => self.node_detached(node),
            SensorEvent::DepthSample {
                node,
                depth,
                timestamp_us,
            } => self.depth_sample(node, &depth, timestamp_us),
            SensorEvent::ColorSample {
                node,
                rgb,
                timestamp_us,
            } => self.color_sample(node, &rgb, timestamp_us),
        }
    }

    /// Unregister any configured nodes at session teardown
    pub(crate) fn shutdown(&mut self, driver: &mut dyn SensorDriver) {
        if let Some(node) = self.depth_node.take() {
            driver.unregister_node(node);
        }
        if let Some(node) = self.color_node.take() {
            driver.unregister_node(node);
        }
    }

    fn device_attached(&mut self, device: DeviceId) {
        if self.device.is_some() {
            debug!(device, "additional device ignored (single-device policy)");
            return;
        }
        info!(device, "device attached");
        self.device = Some(device);
    }

    fn device_detached(&mut self, device: DeviceId) {
        if self.device == Some(device) {
            info!(device, "device disconnected");
            // Node slots are cleared by their own node-detached events,
            // matching driver behavior
            self.device = None;
        }
    }

    fn node_attached(
        &mut self,
        driver: &mut dyn SensorDriver,
        device: DeviceId,
        node: NodeId,
        kind: NodeKind,
    ) {
        if self.device != Some(device) {
            debug!(device, node, "node event from untracked device ignored");
            return;
        }
        match kind {
            NodeKind::Depth => self.configure_depth_node(driver, node),
            NodeKind::Color => self.configure_color_node(driver, node),
            NodeKind::Other => debug!(node, "unsupported node kind ignored"),
        }
    }

    fn node_detached(&mut self, node: NodeId) {
        // The frame buffer stays allocated; deallocation is tied to session
        // stop, not node disconnect
        if self.depth_node == Some(node) {
            info!(node, "depth node disconnected");
            self.depth_node = None;
        } else if self.color_node == Some(node) {
            info!(node, "color node disconnected");
            self.color_node = None;
        }
    }

    fn configure_depth_node(&mut self, driver: &mut dyn SensorDriver, node: NodeId) {
        if self.depth_node.is_some() {
            debug!(node, "depth node already configured");
            return;
        }
        // The slot is taken before configuration is attempted; a failed
        // configuration holds it until the node detaches
        self.depth_node = Some(node);

        let config = DepthConfig {
            framerate: self.options.depth_rate_hz,
            mode: self.options.depth_mode,
            saturation: true,
        };
        match apply_depth(driver, node, &config) {
            Ok(()) => {
                info!(node, rate = config.framerate, mode = ?config.mode, "depth node connected");
                self.depth.allocate();
            }
            Err(err) => {
                let err = CaptureError::from(err);
                warn!(node, error = %err, "depth node left unconfigured");
            }
        }
        driver.register_node(node);
    }

    fn configure_color_node(&mut self, driver: &mut dyn SensorDriver, node: NodeId) {
        if self.color_node.is_some() {
            debug!(node, "color node already configured");
            return;
        }
        self.color_node = Some(node);

        let config = ColorConfig::default();
        match apply_color(driver, node, &config) {
            Ok(()) => {
                info!(node, rate = config.framerate(), "color node connected");
                self.color.allocate();
            }
            Err(err) => {
                let err = CaptureError::from(err);
                warn!(node, error = %err, "color node left unconfigured");
            }
        }
        driver.register_node(node);
    }

    fn depth_sample(&mut self, node: NodeId, raw: &[u16], timestamp_us: u64) {
        if self.depth_node != Some(node) {
            return;
        }
        if raw.len() != DEPTH_PIXEL_COUNT {
            warn!(len = raw.len(), "depth sample with unexpected size dropped");
            return;
        }
        convert::depth_to_grayscale(raw, &mut self.depth_scratch);
        if !self.depth.publish(&self.depth_scratch, timestamp_us / 1000) {
            debug!(node, "depth sample dropped, no buffer allocated");
        }
    }

    fn color_sample(&mut self, node: NodeId, rgb: &[u8], timestamp_us: u64) {
        if self.color_node != Some(node) {
            return;
        }
        if !convert::color_sample_valid(rgb, COLOR_BYTE_COUNT) {
            warn!(len = rgb.len(), "color sample with unexpected size dropped");
            return;
        }
        if !self.color.publish(rgb, timestamp_us / 1000) {
            debug!(node, "color sample dropped, no buffer allocated");
        }
    }

    #[cfg(test)]
    fn tracked_device(&self) -> Option<DeviceId> {
        self.device
    }

    #[cfg(test)]
    fn nodes(&self) -> (Option<NodeId>, Option<NodeId>) {
        (self.depth_node, self.color_node)
    }
}

fn apply_depth(
    driver: &mut dyn SensorDriver,
    node: NodeId,
    config: &DepthConfig,
) -> Result<(), DriverError> {
    driver.request_control(node)?;
    driver.apply_depth_config(node, config)
}

fn apply_color(
    driver: &mut dyn SensorDriver,
    node: NodeId,
    config: &ColorConfig,
) -> Result<(), DriverError> {
    driver.request_control(node)?;
    driver.apply_color_config(node, config)
}
