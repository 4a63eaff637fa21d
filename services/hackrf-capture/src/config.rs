//! Configuration loaded from environment variables

use std::path::PathBuf;
use std::str::FromStr;

use crate::device::{DeviceConfig, DeviceParameters};
use crate::driver::DEFAULT_CHUNK_BYTES;
use crate::sdr::Endianness;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Baseband filter bandwidth in Hz
    pub bandwidth: u32,

    /// Center frequency in Hz
    pub frequency: u64,

    /// Gain applied to the LNA, VGA and TX VGA stages
    pub gain: u32,

    /// Sample rate in samples per second
    pub sample_rate: u32,

    /// Raw sample buffer capacity in bytes
    pub buffer_bytes: usize,

    /// Overwrite the oldest samples when the buffer is full
    pub ring_buffer: bool,

    /// Treat the high byte of each raw word as I
    pub big_endian: bool,

    /// Replay this raw capture instead of opening hardware
    pub replay_path: Option<PathBuf>,

    /// Bytes per replayed burst
    pub replay_chunk_bytes: usize,

    /// Stats logging interval in milliseconds
    pub stats_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = DeviceParameters::default();

        Self {
            bandwidth: parse_or(&lookup, "HACKRF_BANDWIDTH", defaults.bandwidth),

            frequency: parse_or(&lookup, "HACKRF_FREQUENCY", defaults.frequency),

            gain: parse_or(&lookup, "HACKRF_GAIN", defaults.gain),

            sample_rate: parse_or(&lookup, "HACKRF_SAMPLE_RATE", defaults.sample_rate),

            buffer_bytes: parse_or(&lookup, "HACKRF_BUFFER_BYTES", DeviceConfig::default().initial_bufsize),

            ring_buffer: flag(&lookup, "HACKRF_RING_BUFFER"),

            big_endian: flag(&lookup, "HACKRF_BIG_ENDIAN"),

            replay_path: lookup("HACKRF_REPLAY_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),

            replay_chunk_bytes: parse_or(&lookup, "HACKRF_REPLAY_CHUNK", DEFAULT_CHUNK_BYTES),

            stats_interval_ms: parse_or(&lookup, "STATS_INTERVAL_MS", 5000),
        }
    }

    pub fn parameters(&self) -> DeviceParameters {
        DeviceParameters {
            bandwidth: self.bandwidth,
            frequency: self.frequency,
            gain: self.gain,
            sample_rate: self.sample_rate,
        }
    }

    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            parameters: self.parameters(),
            initial_bufsize: self.buffer_bytes,
            ring_buffer: self.ring_buffer,
            endianness: if self.big_endian {
                Endianness::Big
            } else {
                Endianness::Little
            },
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key)
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
