//! HackRF sample path
//!
//! 1. The capture callback pushes raw interleaved 8-bit I/Q bursts into the
//!    buffer channel
//! 2. The buffer drains whole bursts on the consumer side
//! 3. Byte pairs are mapped to normalized complex samples through the LUT
//! 4. Decoded batches can be summarized as average power in dBFS

mod buffer;
mod lut;
mod power;

pub use buffer::{BufferStats, BufferWriter, SampleBuffer};
pub use lut::{Endianness, SampleLut, BYTES_PER_SAMPLE, LUT_SIZE};
pub use power::mean_power_dbfs;
