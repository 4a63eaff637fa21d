//! Native driver capability interface
//!
//! The HackRF device talks to the radio only through [`NativeDriver`]. Raw
//! status codes are normalized to [`Status`] at this boundary.

#[cfg(feature = "libhackrf")]
mod ffi;
#[cfg(test)]
pub(crate) mod mock;
mod replay;

#[cfg(feature = "libhackrf")]
pub use ffi::LibHackrf;
pub use replay::{ReplayDriver, DEFAULT_CHUNK_BYTES};

use std::fmt;

/// Status code the native library reports on success
pub const SUCCESS_CODE: i32 = 0;

/// Callback invoked by the driver, from its own thread, with each raw burst
pub type RxCallback = Box<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Result of a native call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure(i32),
}

impl Status {
    pub fn from_code(code: i32) -> Self {
        if code == SUCCESS_CODE {
            Self::Success
        } else {
            Self::Failure(code)
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(code) => write!(f, "error code {}", code),
        }
    }
}

/// Capabilities the native radio driver exposes.
///
/// All calls are synchronous and expected to return promptly. After
/// `stop_rx` reports success the driver must not invoke the callback again.
pub trait NativeDriver: Send {
    /// Initialize the library and open the device
    fn setup(&mut self) -> Status;

    /// Close the device and release the library
    fn exit(&mut self) -> Status;

    /// Begin asynchronous receive, delivering bursts to `callback`
    fn start_rx(&mut self, callback: RxCallback) -> Status;

    fn stop_rx(&mut self) -> Status;

    fn set_baseband_filter_bandwidth(&mut self, bandwidth_hz: u32) -> Status;

    fn set_freq(&mut self, freq_hz: u64) -> Status;

    fn set_lna_gain(&mut self, gain: u32) -> Status;

    fn set_vga_gain(&mut self, gain: u32) -> Status;

    fn set_txvga_gain(&mut self, gain: u32) -> Status;

    fn set_sample_rate(&mut self, sample_rate: u32) -> Status;
}

impl<D: NativeDriver + ?Sized> NativeDriver for Box<D> {
    fn setup(&mut self) -> Status {
        (**self).setup()
    }

    fn exit(&mut self) -> Status {
        (**self).exit()
    }

    fn start_rx(&mut self, callback: RxCallback) -> Status {
        (**self).start_rx(callback)
    }

    fn stop_rx(&mut self) -> Status {
        (**self).stop_rx()
    }

    fn set_baseband_filter_bandwidth(&mut self, bandwidth_hz: u32) -> Status {
        (**self).set_baseband_filter_bandwidth(bandwidth_hz)
    }

    fn set_freq(&mut self, freq_hz: u64) -> Status {
        (**self).set_freq(freq_hz)
    }

    fn set_lna_gain(&mut self, gain: u32) -> Status {
        (**self).set_lna_gain(gain)
    }

    fn set_vga_gain(&mut self, gain: u32) -> Status {
        (**self).set_vga_gain(gain)
    }

    fn set_txvga_gain(&mut self, gain: u32) -> Status {
        (**self).set_txvga_gain(gain)
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Status {
        (**self).set_sample_rate(sample_rate)
    }
}
