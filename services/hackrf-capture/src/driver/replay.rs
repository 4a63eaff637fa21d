//! Replay driver - feeds a recorded raw IQ capture through the rx callback
//!
//! Stands in for the hardware when no HackRF is attached. The input is the
//! raw interleaved 8-bit I/Q stream exactly as the device delivers it; it is
//! cut into fixed-size bursts and handed to the callback from a dedicated
//! thread, optionally paced to the configured sample rate.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{NativeDriver, RxCallback, Status};
use crate::error::ReplayError;
use crate::sdr::BYTES_PER_SAMPLE;

/// Status code reported when an operation is invalid for the replay state
const REPLAY_ERROR: i32 = -1;

/// HackRF default transfer size (131072 complex samples)
pub const DEFAULT_CHUNK_BYTES: usize = 262_144;

pub struct ReplayDriver {
    data: Arc<Vec<u8>>,
    chunk_bytes: usize,
    looping: bool,
    paced: bool,
    sample_rate: u32,
    opened: bool,
    running: Arc<AtomicBool>,
    bursts: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayDriver {
    /// Replay the contents of a raw capture file
    pub fn from_file(path: impl AsRef<Path>, chunk_bytes: usize) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded replay capture {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(data, chunk_bytes)
    }

    /// Replay an in-memory capture. A trailing half sample is dropped so
    /// every pass starts on an I byte.
    pub fn from_bytes(mut data: Vec<u8>, chunk_bytes: usize) -> Result<Self, ReplayError> {
        let whole = data.len() / BYTES_PER_SAMPLE * BYTES_PER_SAMPLE;
        if whole != data.len() {
            warn!("Replay capture has a partial trailing sample, dropping {} byte(s)", data.len() - whole);
            data.truncate(whole);
        }

        if data.is_empty() {
            return Err(ReplayError::Empty);
        }

        // Keep bursts sample aligned
        let chunk_bytes = chunk_bytes.max(BYTES_PER_SAMPLE) / BYTES_PER_SAMPLE * BYTES_PER_SAMPLE;

        Ok(Self {
            data: Arc::new(data),
            chunk_bytes,
            looping: true,
            paced: true,
            sample_rate: 0,
            opened: false,
            running: Arc::new(AtomicBool::new(false)),
            bursts: Arc::new(AtomicU64::new(0)),
            worker: None,
        })
    }

    /// Restart from the beginning at end of input (default) or stop there
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Sleep between bursts to match the configured sample rate (default)
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Bursts delivered since the driver was created
    pub fn bursts_delivered(&self) -> u64 {
        self.bursts.load(Ordering::Relaxed)
    }

    pub fn is_streaming(&self) -> bool {
        self.worker.is_some()
    }

    fn burst_interval(&self) -> Option<Duration> {
        if !self.paced || self.sample_rate == 0 {
            return None;
        }
        let samples = (self.chunk_bytes / BYTES_PER_SAMPLE) as f64;
        Some(Duration::from_secs_f64(samples / self.sample_rate as f64))
    }

    fn join_worker(&mut self) -> Status {
        self.running.store(false, Ordering::SeqCst);
        match self.worker.take() {
            Some(handle) => match handle.join() {
                Ok(()) => Status::Success,
                Err(_) => {
                    error!("Replay thread panicked");
                    Status::Failure(REPLAY_ERROR)
                }
            },
            None => Status::Success,
        }
    }
}

impl NativeDriver for ReplayDriver {
    fn setup(&mut self) -> Status {
        self.opened = true;
        debug!("Replay source ready ({} bytes)", self.data.len());
        Status::Success
    }

    fn exit(&mut self) -> Status {
        let status = self.join_worker();
        self.opened = false;
        status
    }

    fn start_rx(&mut self, callback: RxCallback) -> Status {
        if !self.opened || self.worker.is_some() {
            return Status::Failure(REPLAY_ERROR);
        }

        let data = self.data.clone();
        let chunk_bytes = self.chunk_bytes;
        let looping = self.looping;
        let interval = self.burst_interval();
        let running = self.running.clone();
        let bursts = self.bursts.clone();

        running.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name("hackrf-replay".to_string())
            .spawn(move || {
                run_replay(&data, chunk_bytes, looping, interval, &running, &bursts, callback)
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Status::Success
            }
            Err(e) => {
                error!("{}", ReplayError::Spawn(e));
                self.running.store(false, Ordering::SeqCst);
                Status::Failure(REPLAY_ERROR)
            }
        }
    }

    fn stop_rx(&mut self) -> Status {
        if self.worker.is_none() {
            return Status::Failure(REPLAY_ERROR);
        }
        self.join_worker()
    }

    fn set_baseband_filter_bandwidth(&mut self, bandwidth_hz: u32) -> Status {
        debug!("Replay: bandwidth {} Hz (no effect)", bandwidth_hz);
        Status::Success
    }

    fn set_freq(&mut self, freq_hz: u64) -> Status {
        debug!("Replay: frequency {} Hz (no effect)", freq_hz);
        Status::Success
    }

    fn set_lna_gain(&mut self, gain: u32) -> Status {
        debug!("Replay: LNA gain {} (no effect)", gain);
        Status::Success
    }

    fn set_vga_gain(&mut self, gain: u32) -> Status {
        debug!("Replay: VGA gain {} (no effect)", gain);
        Status::Success
    }

    fn set_txvga_gain(&mut self, gain: u32) -> Status {
        debug!("Replay: TX VGA gain {} (no effect)", gain);
        Status::Success
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Status {
        self.sample_rate = sample_rate;
        Status::Success
    }
}

/// Burst loop (runs in the replay thread)
fn run_replay(
    data: &[u8],
    chunk_bytes: usize,
    looping: bool,
    interval: Option<Duration>,
    running: &AtomicBool,
    bursts: &AtomicU64,
    callback: RxCallback,
) {
    debug!("Replay thread started ({} byte bursts)", chunk_bytes);

    'outer: while running.load(Ordering::SeqCst) {
        for chunk in data.chunks(chunk_bytes) {
            if !running.load(Ordering::SeqCst) {
                break 'outer;
            }

            callback(chunk);
            bursts.fetch_add(1, Ordering::Relaxed);

            match interval {
                Some(interval) => thread::sleep(interval),
                None => thread::yield_now(),
            }
        }

        if !looping {
            debug!("Replay reached end of input");
            break;
        }
    }

    debug!("Replay thread stopped");
}

impl Drop for ReplayDriver {
    fn drop(&mut self) {
        self.join_worker();
    }
}
