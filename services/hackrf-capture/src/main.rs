//! HackRF Capture - receive raw IQ from a HackRF (or a recorded capture)
//!
//! Opens the device, streams raw 8-bit I/Q bursts into the sample buffer,
//! decodes them through the lookup table and reports signal level and buffer
//! statistics until Ctrl+C.

use anyhow::{bail, Context, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hackrf_capture::driver::NativeDriver;
use hackrf_capture::sdr::mean_power_dbfs;
use hackrf_capture::{Config, HackRf, Outcome, RadioDevice, ReplayDriver};

/// How often buffered samples are decoded
const DECODE_INTERVAL: Duration = Duration::from_millis(100);

/// Bytes of the first burst shown in the log
const FIRST_BURST_PREVIEW: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("===========================================");
    info!("   HackRF Capture");
    info!("   LUT-based 8-bit IQ decoder");
    info!("===========================================");

    let config = Config::from_env();

    info!("Configuration:");
    info!("  Frequency: {} Hz", config.frequency);
    info!("  Sample rate: {} SPS", config.sample_rate);
    info!("  Bandwidth: {} Hz", config.bandwidth);
    info!("  Gain: {}", config.gain);
    info!(
        "  Buffer: {} bytes ({})",
        config.buffer_bytes,
        if config.ring_buffer { "ring" } else { "linear" }
    );

    let driver = select_driver(&config)?;
    let mut device = HackRf::new(driver, config.device_config());

    if let Outcome::Failed(code) = device.open() {
        bail!("Failed to open HackRF (error code {}). Is the device connected?", code);
    }

    if let Outcome::Failed(code) = device.start_rx_mode() {
        device.close();
        bail!("Failed to start HackRF rx mode (error code {})", code);
    }

    info!("===========================================");
    info!("  Capture running. Press Ctrl+C to stop.");
    info!("===========================================");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(DECODE_INTERVAL);
    let stats_interval = Duration::from_millis(config.stats_interval_ms.max(1));
    let mut last_stats = Instant::now();
    let mut first_data = true;
    let mut samples_decoded = 0u64;
    let mut samples_since_stats = 0u64;
    let mut power_sum = 0.0f64;
    let mut power_batches = 0u64;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                let available = device.buffered_samples();
                if available == 0 {
                    continue;
                }

                if first_data {
                    let preview = device.base().buffer().peek(FIRST_BURST_PREVIEW);
                    info!("First IQ data received! ({} samples) {}", available, hex::encode(preview));
                    first_data = false;
                }

                let samples = device
                    .read_samples(available)
                    .context("Buffered samples vanished during decode")?;

                samples_decoded += samples.len() as u64;
                samples_since_stats += samples.len() as u64;
                power_sum += mean_power_dbfs(&samples) as f64;
                power_batches += 1;

                if last_stats.elapsed() >= stats_interval {
                    let elapsed = last_stats.elapsed().as_secs_f64();
                    let stats = device.base().buffer().stats();
                    let avg_power = if power_batches > 0 {
                        power_sum / power_batches as f64
                    } else {
                        0.0
                    };

                    info!(
                        "[Stats] Rate: {:.2} MSPS | Power: {:.1} dBFS | Chunks: {} | Dropped: {} | Overflows: {}",
                        samples_since_stats as f64 / elapsed / 1_000_000.0,
                        avg_power,
                        stats.get_chunks_received(),
                        stats.get_chunks_dropped(),
                        stats.get_overflow_chunks()
                    );

                    last_stats = Instant::now();
                    samples_since_stats = 0;
                    power_sum = 0.0;
                    power_batches = 0;
                }
            }
        }
    }

    device.stop_rx_mode("user requested shutdown");
    device.close();

    info!("Shutdown complete. Samples decoded: {}", samples_decoded);
    Ok(())
}

/// Pick the replay driver when a capture file is configured, else the hardware
fn select_driver(config: &Config) -> Result<Box<dyn NativeDriver>> {
    if let Some(path) = &config.replay_path {
        info!("Replaying raw capture from {}", path.display());
        let driver = ReplayDriver::from_file(path, config.replay_chunk_bytes)
            .context("Failed to load replay capture")?;
        return Ok(Box::new(driver));
    }

    hardware_driver()
}

#[cfg(feature = "libhackrf")]
fn hardware_driver() -> Result<Box<dyn NativeDriver>> {
    info!("Using libhackrf driver");
    Ok(Box::new(hackrf_capture::driver::LibHackrf::new()))
}

#[cfg(not(feature = "libhackrf"))]
fn hardware_driver() -> Result<Box<dyn NativeDriver>> {
    bail!("No HackRF driver available: set HACKRF_REPLAY_PATH or build with --features libhackrf")
}
