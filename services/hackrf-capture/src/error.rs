//! Error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sample decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer raw bytes are buffered than the requested sample count needs
    #[error("buffer underrun: requested {requested} samples, {available} available")]
    BufferUnderrun { requested: usize, available: usize },
}

/// Errors from the replay driver's input source
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("replay input is empty")]
    Empty,

    #[error("failed to spawn replay thread: {0}")]
    Spawn(#[source] io::Error),
}
