// SPDX-License-Identifier: GPL-3.0-only

//! Fixed stream geometry and sensor constants
//!
//! The DS325 stream layouts are compile-time constants, not negotiated with
//! the driver: the depth node always delivers QVGA depth maps and the color
//! node always delivers VGA RGB.

use std::time::Duration;

/// Depth stream width in pixels (QVGA)
pub const DEPTH_WIDTH: u32 = 320;
/// Depth stream height in pixels (QVGA)
pub const DEPTH_HEIGHT: u32 = 240;
/// Depth pixels per frame (320x240)
pub const DEPTH_PIXEL_COUNT: usize = (DEPTH_WIDTH * DEPTH_HEIGHT) as usize;

/// Color stream width in pixels (VGA)
pub const COLOR_WIDTH: u32 = 640;
/// Color stream height in pixels (VGA)
pub const COLOR_HEIGHT: u32 = 480;
/// Color channels per pixel (interleaved RGB)
pub const COLOR_CHANNELS: u32 = 3;
/// Color bytes per frame (640x480x3)
pub const COLOR_BYTE_COUNT: usize = (COLOR_WIDTH * COLOR_HEIGHT * COLOR_CHANNELS) as usize;

/// Raw depth readings at or above this value are oversaturated/invalid
/// and map to grayscale 0.
pub const DEPTH_SENTINEL: u16 = 32002;

/// Default target frame rate for both stream kinds
pub const DEFAULT_FRAME_RATE_HZ: u32 = 30;

/// How long the capture loop blocks in `poll_event` before re-checking
/// the stop flag.
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(10);
