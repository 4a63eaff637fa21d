//! HackRF receive core
//!
//! Drives a HackRF through a native driver interface, collects the raw 8-bit
//! I/Q bursts its capture callback delivers, and decodes them into normalized
//! complex baseband samples through a 65536-entry lookup table.

pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod sdr;

pub use config::Config;
pub use device::{DeviceConfig, DeviceParameters, HackRf, Outcome, RadioDevice};
pub use driver::{NativeDriver, ReplayDriver, Status};
pub use error::{DecodeError, ReplayError};
