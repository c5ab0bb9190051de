// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Owns the capture thread and the two stream buffers. `start` spawns the
//! thread, which builds a driver instance from the session's factory,
//! replays already-attached devices/nodes, and then polls the driver event
//! loop until `stop` clears the running flag. Snapshot accessors are safe
//! to call from any thread at any time, concurrently with capture.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::driver::{DepthMode, SensorDriver};
use super::lifecycle::Lifecycle;
use super::stream::{FrameSnapshot, SharedStream, StreamShape};
use crate::constants::{
    COLOR_CHANNELS, COLOR_HEIGHT, COLOR_WIDTH, DEFAULT_FRAME_RATE_HZ, DEPTH_HEIGHT, DEPTH_WIDTH,
    EVENT_POLL_INTERVAL,
};
use crate::errors::{CaptureError, CaptureResult};

/// Caller-supplied parameters for `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOptions {
    /// Depth stream target frame rate in Hz, must be positive
    pub depth_rate_hz: u32,
    /// Depth camera operating mode
    pub depth_mode: DepthMode,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            depth_rate_hz: DEFAULT_FRAME_RATE_HZ,
            depth_mode: DepthMode::Close,
        }
    }
}

/// The capture session: one managed device, up to one depth and one color
/// stream, and one event-loop thread
///
/// Exactly one session should exist per physical sensor. All mutable
/// device/node state lives on the capture thread; the session itself holds
/// only the running flag, the join handle, and the shared stream buffers.
pub struct CaptureSession {
    driver_factory: Box<dyn Fn() -> Box<dyn SensorDriver> + Send>,
    running: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
    depth: SharedStream,
    color: SharedStream,
}

impl CaptureSession {
    /// Create a stopped session. The factory is invoked once per `start`
    /// to build a fresh driver context for the capture thread.
    pub fn new<D, F>(driver_factory: F) -> Self
    where
        D: SensorDriver + 'static,
        F: Fn() -> D + Send + 'static,
    {
        Self {
            driver_factory: Box::new(move || Box::new(driver_factory())),
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            depth: SharedStream::new(StreamShape {
                width: DEPTH_WIDTH,
                height: DEPTH_HEIGHT,
                channels: 1,
            }),
            color: SharedStream::new(StreamShape {
                width: COLOR_WIDTH,
                height: COLOR_HEIGHT,
                channels: COLOR_CHANNELS,
            }),
        }
    }

    /// Spawn the capture thread. Non-blocking; returns as soon as the
    /// thread is launched. Fails with `AlreadyRunning` if a session is
    /// live and `Configuration` if the requested rate is not positive.
    pub fn start(&mut self, options: StartOptions) -> CaptureResult<()> {
        if self.capture_thread.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        if options.depth_rate_hz == 0 {
            return Err(CaptureError::Configuration(
                "depth frame rate must be positive".to_string(),
            ));
        }

        info!(rate = options.depth_rate_hz, mode = ?options.depth_mode, "starting capture session");

        let driver = (self.driver_factory)();
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let depth = self.depth.clone();
        let color = self.color.clone();
        let handle = thread::Builder::new()
            .name("ds-capture".to_string())
            .spawn(move || capture_main(driver, running, options, depth, color))
            .map_err(|e| CaptureError::Configuration(format!("capture thread: {}", e)))?;
        self.capture_thread = Some(handle);
        Ok(())
    }

    /// Signal the event loop to terminate, wait for the capture thread to
    /// exit, and free both frame buffers. Blocking, bounded by driver
    /// shutdown time. Fails with `NotRunning` (and changes nothing) if no
    /// session is live.
    pub fn stop(&mut self) -> CaptureResult<()> {
        let Some(handle) = self.capture_thread.take() else {
            return Err(CaptureError::NotRunning);
        };

        info!("stopping capture session");
        self.running.store(false, Ordering::SeqCst);
        if handle.join().is_err() {
            warn!("capture thread panicked during shutdown");
        }

        // Buffer lifetime is tied to the session: release on stop resets
        // sequence counters and timestamps to the pre-sample state
        self.depth.release();
        self.color.release();
        info!("capture session stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Latest depth frame as 240x320 row-major grayscale; zero-filled
    /// before the first sample
    pub fn depth_frame(&self) -> FrameSnapshot {
        self.depth.snapshot()
    }

    /// Latest color frame as 480x640x3 row-major RGB; zero-filled before
    /// the first sample
    pub fn color_frame(&self) -> FrameSnapshot {
        self.color.snapshot()
    }

    /// Capture timestamp of the latest depth sample in ms, 0 if none
    pub fn last_depth_timestamp_ms(&self) -> u64 {
        self.depth.last_timestamp_ms()
    }

    /// Sequence counter of the latest depth sample, 0 if none
    pub fn last_depth_sequence(&self) -> u64 {
        self.depth.last_sequence()
    }

    /// Capture timestamp of the latest color sample in ms, 0 if none
    pub fn last_color_timestamp_ms(&self) -> u64 {
        self.color.last_timestamp_ms()
    }

    /// Sequence counter of the latest color sample, 0 if none
    pub fn last_color_sequence(&self) -> u64 {
        self.color.last_sequence()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.capture_thread.is_some() {
            let _ = self.stop();
        }
    }
}

/// Capture thread body: enumerate, run the event loop until the running
/// flag clears, then tear down in driver order (stop delivery, unregister)
fn capture_main(
    mut driver: Box<dyn SensorDriver>,
    running: Arc<AtomicBool>,
    options: StartOptions,
    depth: SharedStream,
    color: SharedStream,
) {
    debug!("capture thread started");
    let mut lifecycle = Lifecycle::new(options, depth, color);

    // Nodes present before the loop begins take the same path as hotplug
    lifecycle.enumerate(driver.as_mut());
    driver.start_nodes();

    while running.load(Ordering::SeqCst) {
        if let Some(event) = driver.poll_event(EVENT_POLL_INTERVAL) {
            lifecycle.handle_event(driver.as_mut(), event);
        }
    }

    driver.stop_nodes();
    lifecycle.shutdown(driver.as_mut());
    debug!("capture thread exiting");
}
