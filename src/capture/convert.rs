// SPDX-License-Identifier: GPL-3.0-only

//! Per-pixel frame conversion for the two stream kinds
//!
//! Depth samples are compressed to 8-bit grayscale on a logarithmic scale:
//! the log deemphasizes differences as range increases, which matches how
//! operational relevance falls off with distance. Color samples are already
//! interleaved RGB and pass through untouched.

use crate::constants::DEPTH_SENTINEL;

/// Convert a raw depth map to 8-bit grayscale, one output byte per pixel.
///
/// Valid readings (`raw < 32002`) map to
/// `round(255 / log10(32001) * log10(raw + 1))`; the `+1` keeps the log
/// defined at zero range. Readings at or above the sentinel are
/// oversaturated and map to 0. The mapping is monotonic over the valid
/// domain and bounded by 255 at `raw = 32001`.
///
/// `out` must be exactly as long as `raw`; the whole buffer is overwritten.
pub fn depth_to_grayscale(raw: &[u16], out: &mut [u8]) {
    debug_assert_eq!(raw.len(), out.len());

    let scale = 255.0 / f64::from(DEPTH_SENTINEL - 1).log10();
    for (dst, &depth) in out.iter_mut().zip(raw) {
        *dst = if depth < DEPTH_SENTINEL {
            (scale * f64::from(depth + 1).log10()).round() as u8
        } else {
            0
        };
    }
}

/// Validate that a raw color sample has the expected interleaved-RGB length.
///
/// The color path is a byte-for-byte copy; the only thing that can go wrong
/// is a short or oversized sample from the driver.
pub fn color_sample_valid(rgb: &[u8], expected_len: usize) -> bool {
    rgb.len() == expected_len
}
