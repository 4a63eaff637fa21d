//! Radio device abstraction
//!
//! [`RadioDevice`] is the contract any capture device satisfies: lifecycle,
//! streaming, parameter setters and access to the raw sample buffer. Shared
//! state (cached parameters and the buffer) lives in a [`DeviceBase`] that the
//! concrete device holds.

mod hackrf;
mod state;

pub use hackrf::HackRf;
pub use state::{DeviceParameters, DeviceState, Outcome, StreamState};

use num_complex::Complex32;

use crate::error::DecodeError;
use crate::sdr::{Endianness, SampleBuffer, BYTES_PER_SAMPLE};

/// Construction-time settings for a device
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub parameters: DeviceParameters,
    /// Raw buffer capacity in bytes
    pub initial_bufsize: usize,
    /// Overwrite the oldest bytes instead of rejecting new ones when full
    pub ring_buffer: bool,
    /// Byte order used to build the lookup table
    pub endianness: Endianness,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            parameters: DeviceParameters::default(),
            initial_bufsize: 64 * 1024 * 1024,
            ring_buffer: false,
            endianness: Endianness::Little,
        }
    }
}

/// State every device shares: cached parameters and the raw byte buffer
pub struct DeviceBase {
    pub parameters: DeviceParameters,
    buffer: SampleBuffer,
}

impl DeviceBase {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            parameters: config.parameters,
            buffer: SampleBuffer::new(config.initial_bufsize, config.ring_buffer),
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
}

/// Contract between a generic capture device and a specific radio
pub trait RadioDevice {
    fn base(&self) -> &DeviceBase;

    fn base_mut(&mut self) -> &mut DeviceBase;

    fn open(&mut self) -> Outcome;

    fn close(&mut self) -> Outcome;

    fn is_open(&self) -> bool;

    fn is_receiving(&self) -> bool;

    fn start_rx_mode(&mut self) -> Outcome;

    /// Stop receiving; `reason` is logged on success
    fn stop_rx_mode(&mut self, reason: &str) -> Outcome;

    fn set_device_bandwidth(&mut self, bandwidth: u32) -> Outcome;

    fn set_device_frequency(&mut self, frequency: u64) -> Outcome;

    fn set_device_gain(&mut self, gain: u32) -> Outcome;

    fn set_device_sample_rate(&mut self, sample_rate: u32) -> Outcome;

    /// Decode the first `n` buffered samples without consuming them
    fn unpack_complex(&mut self, n: usize) -> Result<Vec<Complex32>, DecodeError>;

    fn parameters(&self) -> DeviceParameters {
        self.base().parameters
    }

    /// Cache the bandwidth and forward it to the device if open
    fn set_bandwidth(&mut self, bandwidth: u32) -> Outcome {
        self.base_mut().parameters.bandwidth = bandwidth;
        self.set_device_bandwidth(bandwidth)
    }

    fn set_frequency(&mut self, frequency: u64) -> Outcome {
        self.base_mut().parameters.frequency = frequency;
        self.set_device_frequency(frequency)
    }

    fn set_gain(&mut self, gain: u32) -> Outcome {
        self.base_mut().parameters.gain = gain;
        self.set_device_gain(gain)
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Outcome {
        self.base_mut().parameters.sample_rate = sample_rate;
        self.set_device_sample_rate(sample_rate)
    }

    /// Push every cached parameter to the device
    fn set_device_parameters(&mut self) {
        let params = self.parameters();
        self.set_device_bandwidth(params.bandwidth);
        self.set_device_sample_rate(params.sample_rate);
        self.set_device_frequency(params.frequency);
        self.set_device_gain(params.gain);
    }

    /// Complete samples currently buffered
    fn buffered_samples(&mut self) -> usize {
        self.base_mut().buffer_mut().buffered_samples()
    }

    /// Decode the first `n` buffered samples and remove them from the buffer
    fn read_samples(&mut self, n: usize) -> Result<Vec<Complex32>, DecodeError> {
        let samples = self.unpack_complex(n)?;
        self.base_mut().buffer_mut().consume(n * BYTES_PER_SAMPLE);
        Ok(samples)
    }
}
