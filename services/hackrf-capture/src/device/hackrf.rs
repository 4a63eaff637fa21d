//! HackRF device - lifecycle, parameters and rx streaming over a native driver

use num_complex::Complex32;
use tracing::{debug, error, info, warn};

use super::state::{DeviceState, Outcome, StreamState};
use super::{DeviceBase, DeviceConfig, RadioDevice};
use crate::driver::{NativeDriver, RxCallback};
use crate::error::DecodeError;
use crate::sdr::{BufferWriter, SampleLut, BYTES_PER_SAMPLE};

/// HackRF capture device.
///
/// Every operation is a guarded no-op in the wrong state, and native failures
/// are logged and reported as [`Outcome::Failed`], never raised.
pub struct HackRf<D: NativeDriver> {
    driver: D,
    lut: SampleLut,
    base: DeviceBase,
    state: DeviceState,
    stream: StreamState,
    writer: Option<BufferWriter>,
}

impl<D: NativeDriver> HackRf<D> {
    /// Create a closed device. The lookup table is built here, once.
    pub fn new(driver: D, config: DeviceConfig) -> Self {
        Self {
            driver,
            lut: SampleLut::new(config.endianness),
            base: DeviceBase::new(&config),
            state: DeviceState::Closed,
            stream: StreamState::Idle,
            writer: None,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream
    }

    pub fn lut(&self) -> &SampleLut {
        &self.lut
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn skipped(&self, op: &str) -> Outcome {
        debug!("HackRF {} ignored (device {:?}, {:?})", op, self.state, self.stream);
        Outcome::Skipped
    }
}

impl<D: NativeDriver> RadioDevice for HackRf<D> {
    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DeviceBase {
        &mut self.base
    }

    fn open(&mut self) -> Outcome {
        if self.is_open() {
            return self.skipped("open");
        }

        let status = self.driver.setup();
        if status.is_success() {
            self.state = DeviceState::Open;
            info!("successfully opened HackRF");
        } else {
            warn!("failed to open HackRF ({})", status);
        }
        status.into()
    }

    fn close(&mut self) -> Outcome {
        if !self.is_open() {
            return self.skipped("close");
        }

        if self.is_receiving() {
            self.stop_rx_mode("device closing");
        }

        let status = self.driver.exit();
        if status.is_success() {
            // Exit tears down any rx the failed stop left running
            if let Some(writer) = self.writer.take() {
                writer.close();
            }
            self.stream = StreamState::Idle;
            self.state = DeviceState::Closed;
            info!("successfully closed HackRF");
        } else {
            error!("failed to close HackRF ({})", status);
        }
        status.into()
    }

    fn is_open(&self) -> bool {
        self.state == DeviceState::Open
    }

    fn is_receiving(&self) -> bool {
        self.is_open() && self.stream == StreamState::Receiving
    }

    fn start_rx_mode(&mut self) -> Outcome {
        if !self.is_open() || self.stream != StreamState::Idle {
            return self.skipped("start_rx_mode");
        }

        self.set_device_parameters();

        let writer = self.base.buffer().writer();
        let producer = writer.clone();
        let callback: RxCallback = Box::new(move |chunk: &[u8]| {
            producer.push(chunk);
        });

        let status = self.driver.start_rx(callback);
        if status.is_success() {
            self.writer = Some(writer);
            self.stream = StreamState::Receiving;
            info!("successfully started HackRF rx mode ({})", self.base.parameters);
        } else {
            writer.close();
            error!("could not start HackRF rx mode ({})", status);
        }
        status.into()
    }

    fn stop_rx_mode(&mut self, reason: &str) -> Outcome {
        if !self.is_receiving() {
            return self.skipped("stop_rx_mode");
        }

        info!("Stopping rx mode");
        let status = self.driver.stop_rx();
        if status.is_success() {
            // Waits out an in-flight callback; nothing lands after this
            if let Some(writer) = self.writer.take() {
                writer.close();
            }
            self.stream = StreamState::Idle;
            info!("stopped HackRF rx mode ({})", reason);
        } else {
            error!("could not stop HackRF rx mode ({})", status);
        }
        status.into()
    }

    fn set_device_bandwidth(&mut self, bandwidth: u32) -> Outcome {
        if !self.is_open() {
            return self.skipped("set bandwidth");
        }

        let status = self.driver.set_baseband_filter_bandwidth(bandwidth);
        if status.is_success() {
            info!("successfully set HackRF bandwidth to {}", bandwidth);
        } else {
            error!("failed to set HackRF bandwidth to {} ({})", bandwidth, status);
        }
        status.into()
    }

    fn set_device_frequency(&mut self, frequency: u64) -> Outcome {
        if !self.is_open() {
            return self.skipped("set frequency");
        }

        let status = self.driver.set_freq(frequency);
        if status.is_success() {
            info!("successfully set HackRF frequency to {}", frequency);
        } else {
            error!("failed to set HackRF frequency to {} ({})", frequency, status);
        }
        status.into()
    }

    /// Apply `gain` to the LNA, VGA and TX VGA stages.
    ///
    /// The per-stage statuses are not checked: a failing stage is not
    /// surfaced and the outcome is always `Applied` while open.
    fn set_device_gain(&mut self, gain: u32) -> Outcome {
        if !self.is_open() {
            return self.skipped("set gain");
        }

        let _ = self.driver.set_lna_gain(gain);
        let _ = self.driver.set_vga_gain(gain);
        let _ = self.driver.set_txvga_gain(gain);
        debug!("set HackRF gain stages to {}", gain);
        Outcome::Applied
    }

    fn set_device_sample_rate(&mut self, sample_rate: u32) -> Outcome {
        if !self.is_open() {
            return self.skipped("set sample rate");
        }

        let status = self.driver.set_sample_rate(sample_rate);
        if status.is_success() {
            info!("successfully set HackRF sample rate to {}", sample_rate);
        } else {
            error!("failed to set HackRF sample rate to {} ({})", sample_rate, status);
        }
        status.into()
    }

    fn unpack_complex(&mut self, n: usize) -> Result<Vec<Complex32>, DecodeError> {
        let buffer = self.base.buffer_mut();
        let available = buffer.available() / BYTES_PER_SAMPLE;
        if available < n {
            return Err(DecodeError::BufferUnderrun {
                requested: n,
                available,
            });
        }

        let (front, back) = buffer.as_slices();
        let mut samples = Vec::with_capacity(n);
        self.lut.unpack_split_into(front, back, n, &mut samples);
        Ok(samples)
    }
}

impl<D: NativeDriver> Drop for HackRf<D> {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}
