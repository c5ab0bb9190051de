// SPDX-License-Identifier: GPL-3.0-only

//! Demo binary: runs the capture pipeline against the virtual sensor and
//! reports per-stream frame statistics once per second. A binding over the
//! real DepthSense SDK would swap in its own [`dscapture::SensorDriver`]
//! implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;

use dscapture::{CaptureSession, DepthMode, StartOptions, VirtualSensor};

#[derive(Parser)]
#[command(name = "dscapture")]
#[command(about = "DS325 capture pipeline demo (virtual sensor)")]
#[command(version)]
struct Cli {
    /// Depth stream frame rate in Hz
    #[arg(short, long, default_value = "30")]
    rate: u32,

    /// Depth camera mode: close or long
    #[arg(short, long, default_value = "close")]
    mode: String,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// Simulate plugging the sensor in after startup instead of having it
    /// present at enumeration time
    #[arg(long)]
    hotplug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=dscapture=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mode = match cli.mode.as_str() {
        "close" => DepthMode::Close,
        "long" => DepthMode::LongRange,
        other => return Err(format!("unknown depth mode: {}", other).into()),
    };

    let mut session = if cli.hotplug {
        CaptureSession::new(VirtualSensor::hotplug)
    } else {
        CaptureSession::new(VirtualSensor::new)
    };
    session.start(StartOptions {
        depth_rate_hz: cli.rate,
        depth_mode: mode,
    })?;

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::SeqCst);
    })?;

    let started = Instant::now();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_secs(1));
        info!(
            depth_seq = session.last_depth_sequence(),
            depth_ts_ms = session.last_depth_timestamp_ms(),
            color_seq = session.last_color_sequence(),
            color_ts_ms = session.last_color_timestamp_ms(),
            "frame statistics"
        );
        if cli.duration > 0 && started.elapsed() >= Duration::from_secs(cli.duration) {
            break;
        }
    }

    session.stop()?;
    Ok(())
}
