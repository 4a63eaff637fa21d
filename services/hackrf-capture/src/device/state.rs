//! Device state and parameter tracking

use std::fmt;

use crate::driver::Status;

/// Whether the native device is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Closed,
    Open,
}

/// Receive streaming state, meaningful only while Open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Receiving,
}

/// What a lifecycle or parameter operation did.
///
/// Native failures are reported here rather than as errors so a long-running
/// capture session keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The native call ran and succeeded
    Applied,
    /// Not valid in the current state; no native call was made
    Skipped,
    /// The native call reported failure
    Failed(i32),
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

impl From<Status> for Outcome {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => Self::Applied,
            Status::Failure(code) => Self::Failed(code),
        }
    }
}

/// Radio parameters cached by the device and pushed to the driver while open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceParameters {
    /// Baseband filter bandwidth in Hz
    pub bandwidth: u32,
    /// Center frequency in Hz
    pub frequency: u64,
    /// Gain applied to every amplifier stage
    pub gain: u32,
    /// Samples per second
    pub sample_rate: u32,
}

impl Default for DeviceParameters {
    fn default() -> Self {
        Self {
            bandwidth: 1_000_000,
            frequency: 433_920_000,
            gain: 20,
            sample_rate: 2_000_000,
        }
    }
}

impl fmt::Display for DeviceParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} MHz, {:.3} MSPS, BW {:.3} MHz, gain {}",
            self.frequency as f64 / 1e6,
            self.sample_rate as f64 / 1e6,
            self.bandwidth as f64 / 1e6,
            self.gain
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_states() {
        assert_eq!(DeviceState::default(), DeviceState::Closed);
        assert_eq!(StreamState::default(), StreamState::Idle);
    }

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(Outcome::from(Status::Success), Outcome::Applied);
        assert_eq!(Outcome::from(Status::Failure(-1002)), Outcome::Failed(-1002));
        assert!(!Outcome::Skipped.is_applied());
    }

    #[test]
    fn test_parameters_display() {
        let params = DeviceParameters::default();
        assert_eq!(params.to_string(), "433.920 MHz, 2.000 MSPS, BW 1.000 MHz, gain 20");
    }
}
