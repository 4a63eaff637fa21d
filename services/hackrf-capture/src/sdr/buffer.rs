//! Raw byte buffer between the capture callback and the decoder
//!
//! The capture callback (producer) pushes whole chunks into a bounded
//! crossbeam channel through a [`BufferWriter`]. The decoder side
//! ([`SampleBuffer`]) drains the channel into its own byte deque before every
//! read, so a chunk is either fully visible or not visible at all, and the
//! producer never waits on the consumer.
//!
//! Chunks are expected to be whole device transfers, which are always an even
//! number of bytes. A chunk dropped at a full channel is not realigned.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::lut::BYTES_PER_SAMPLE;

/// Chunks that may be in flight between producer and consumer
const CHANNEL_DEPTH: usize = 1024;

/// Counters shared by producer and consumer (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct BufferStats {
    pub chunks_received: AtomicU64,
    pub bytes_received: AtomicU64,
    pub chunks_dropped: AtomicU64,
    pub overflow_chunks: AtomicU64,
}

impl BufferStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record_received(&self, bytes: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.chunks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_overflow(&self) {
        self.overflow_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_chunks_received(&self) -> u64 {
        self.chunks_received.load(Ordering::Relaxed)
    }

    pub fn get_bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn get_chunks_dropped(&self) -> u64 {
        self.chunks_dropped.load(Ordering::Relaxed)
    }

    pub fn get_overflow_chunks(&self) -> u64 {
        self.overflow_chunks.load(Ordering::Relaxed)
    }
}

/// Producer handle given to the capture callback.
///
/// The sender sits behind a gate. Pushes hold the read side for the duration
/// of one send; [`BufferWriter::close`] takes the write side, so once it
/// returns no push is in flight and none will land afterwards.
#[derive(Clone)]
pub struct BufferWriter {
    gate: Arc<RwLock<Option<Sender<Vec<u8>>>>>,
    stats: Arc<BufferStats>,
}

impl BufferWriter {
    /// Append one raw chunk. Never blocks; returns false if the chunk was
    /// dropped because the gate is closed or the channel is full.
    pub fn push(&self, chunk: &[u8]) -> bool {
        if chunk.is_empty() {
            return true;
        }

        let gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = gate.as_ref() else {
            return false;
        };

        match tx.try_send(chunk.to_vec()) {
            Ok(()) => {
                self.stats.record_received(chunk.len());
                true
            }
            Err(TrySendError::Full(_)) => {
                self.stats.record_dropped();
                debug!("Sample channel full, dropping {} byte chunk", chunk.len());
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stop accepting chunks, waiting out any push already in progress
    pub fn close(&self) {
        let mut gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        *gate = None;
    }

    pub fn is_open(&self) -> bool {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Consumer side of the raw byte stream
pub struct SampleBuffer {
    data: VecDeque<u8>,
    capacity: usize,
    ring: bool,
    /// Bytes to discard from the next chunk to regain sample alignment
    skip: usize,
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    stats: Arc<BufferStats>,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` bytes.
    ///
    /// With `ring` set, bytes that do not fit push the oldest bytes out;
    /// otherwise chunks that do not fit are rejected. Dropping the oldest
    /// bytes is O(dropped), not O(buffered).
    pub fn new(capacity: usize, ring: bool) -> Self {
        let (tx, rx) = bounded::<Vec<u8>>(CHANNEL_DEPTH);

        Self {
            data: VecDeque::new(),
            capacity: capacity.max(BYTES_PER_SAMPLE),
            ring,
            skip: 0,
            tx,
            rx,
            stats: BufferStats::new(),
        }
    }

    /// Hand out a new producer handle with its own gate
    pub fn writer(&self) -> BufferWriter {
        BufferWriter {
            gate: Arc::new(RwLock::new(Some(self.tx.clone()))),
            stats: self.stats.clone(),
        }
    }

    /// Move every chunk waiting in the channel into the buffer.
    /// Returns the number of bytes appended.
    pub fn sync(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(chunk) = self.rx.try_recv() {
            appended += self.append(&chunk);
        }
        appended
    }

    fn append(&mut self, chunk: &[u8]) -> usize {
        // Tail of a sample whose head went out with a rejected chunk
        let skip = self.skip.min(chunk.len());
        self.skip -= skip;
        let chunk = &chunk[skip..];

        let needed = self.data.len() + chunk.len();
        if needed <= self.capacity {
            self.data.extend(chunk);
            return chunk.len();
        }

        if !self.ring {
            self.stats.record_overflow();
            // Rejecting an odd-length chunk leaves half a sample behind
            self.skip = chunk.len() % BYTES_PER_SAMPLE;
            debug!(
                "Buffer full ({} of {} bytes), rejecting {} byte chunk",
                self.data.len(),
                self.capacity,
                chunk.len()
            );
            return 0;
        }

        self.stats.record_overflow();

        if chunk.len() >= self.capacity {
            // The chunk alone fills the buffer: keep its tail, sample aligned
            let start = (chunk.len() - self.capacity).next_multiple_of(BYTES_PER_SAMPLE);
            self.data.clear();
            self.data.extend(&chunk[start..]);
            return chunk.len() - start;
        }

        let excess = (needed - self.capacity).next_multiple_of(BYTES_PER_SAMPLE);
        let excess = excess.min(self.data.len());
        self.data.drain(..excess);
        self.data.extend(chunk);
        chunk.len()
    }

    /// Bytes currently buffered, after draining the channel
    pub fn available(&mut self) -> usize {
        self.sync();
        self.data.len()
    }

    /// Complete raw samples currently buffered
    pub fn buffered_samples(&mut self) -> usize {
        self.available() / BYTES_PER_SAMPLE
    }

    /// Buffered bytes as of the last sync, oldest first. The second slice
    /// continues the first when the storage has wrapped.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        self.data.as_slices()
    }

    /// Copy of up to `max` of the oldest buffered bytes
    pub fn peek(&self, max: usize) -> Vec<u8> {
        self.data.iter().take(max).copied().collect()
    }

    /// Remove up to `bytes` from the front of the buffer
    pub fn consume(&mut self, bytes: usize) {
        let bytes = bytes.min(self.data.len());
        self.data.drain(..bytes);
    }

    /// Drop everything buffered, including chunks still in the channel
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.data.clear();
        self.skip = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_ring(&self) -> bool {
        self.ring
    }

    pub fn stats(&self) -> &Arc<BufferStats> {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_then_sync() {
        let mut buffer = SampleBuffer::new(1024, false);
        let writer = buffer.writer();

        assert!(writer.push(&[1, 2, 3, 4]));
        assert!(writer.push(&[5, 6]));

        // Nothing is visible until the consumer syncs
        assert!(buffer.peek(usize::MAX).is_empty());
        assert_eq!(buffer.sync(), 6);
        assert_eq!(buffer.peek(usize::MAX), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.buffered_samples(), 3);

        let stats = buffer.stats();
        assert_eq!(stats.get_chunks_received(), 2);
        assert_eq!(stats.get_bytes_received(), 6);
    }

    #[test]
    fn test_closed_writer_rejects() {
        let mut buffer = SampleBuffer::new(1024, false);
        let writer = buffer.writer();
        let clone = writer.clone();

        writer.close();

        assert!(!writer.is_open());
        assert!(!clone.push(&[1, 2]));
        assert_eq!(buffer.available(), 0);

        // A fresh writer is independent of the closed one
        let next = buffer.writer();
        assert!(next.push(&[9, 9]));
        assert_eq!(buffer.available(), 2);
    }

    #[test]
    fn test_linear_overflow_rejects_chunk() {
        let mut buffer = SampleBuffer::new(4, false);
        let writer = buffer.writer();

        writer.push(&[1, 2, 3, 4]);
        writer.push(&[5, 6]);

        assert_eq!(buffer.available(), 4);
        assert_eq!(buffer.peek(usize::MAX), &[1, 2, 3, 4]);
        assert_eq!(buffer.stats().get_overflow_chunks(), 1);
    }

    #[test]
    fn test_linear_odd_rejection_keeps_alignment() {
        let mut buffer = SampleBuffer::new(4, false);
        let writer = buffer.writer();

        writer.push(&[1, 2]);
        // Does not fit; its last byte is the I half of a sample
        writer.push(&[3, 4, 5]);
        buffer.sync();
        buffer.consume(2);

        // 6 is the Q half of the rejected sample and is discarded
        writer.push(&[6, 7, 8]);
        assert_eq!(buffer.available(), 2);
        assert_eq!(buffer.peek(usize::MAX), &[7, 8]);
    }

    #[test]
    fn test_ring_overflow_keeps_alignment() {
        let mut buffer = SampleBuffer::new(6, true);
        let writer = buffer.writer();

        writer.push(&[1, 2, 3, 4]);
        writer.push(&[5, 6, 7]);

        // 7 bytes into 6: drop an even count (2) from the front
        assert_eq!(buffer.available(), 5);
        assert_eq!(buffer.peek(usize::MAX), &[3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_ring_chunk_larger_than_capacity() {
        let mut buffer = SampleBuffer::new(4, true);
        let writer = buffer.writer();

        writer.push(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buffer.peek(usize::MAX).len(), 0);
        assert_eq!(buffer.available(), 4);
        assert_eq!(buffer.peek(usize::MAX), &[5, 6, 7, 8]);
    }

    #[test]
    fn test_ring_full_keeps_newest_bytes() {
        let mut buffer = SampleBuffer::new(1024, true);
        let writer = buffer.writer();

        let stream: Vec<u8> = (0..=255u8).cycle().take(64 * 100).collect();
        for chunk in stream.chunks(64) {
            writer.push(chunk);
            buffer.sync();
        }

        assert_eq!(buffer.available(), 1024);
        assert_eq!(buffer.peek(usize::MAX), &stream[stream.len() - 1024..]);
        assert_eq!(buffer.stats().get_overflow_chunks(), 100 - 16);

        let (front, back) = buffer.as_slices();
        assert_eq!(front.len() + back.len(), 1024);
        assert_eq!(buffer.peek(4), &stream[stream.len() - 1024..][..4]);
    }

    #[test]
    fn test_consume_and_clear() {
        let mut buffer = SampleBuffer::new(64, false);
        let writer = buffer.writer();

        writer.push(&[1, 2, 3, 4, 5, 6]);
        buffer.sync();
        buffer.consume(4);
        assert_eq!(buffer.peek(usize::MAX), &[5, 6]);

        buffer.consume(100);
        assert!(buffer.peek(usize::MAX).is_empty());

        writer.push(&[7, 8]);
        buffer.clear();
        assert_eq!(buffer.available(), 0);
    }

    #[test]
    fn test_producer_thread_never_blocks() {
        let mut buffer = SampleBuffer::new(usize::MAX, false);
        let writer = buffer.writer();

        let producer = thread::spawn(move || {
            for _ in 0..(CHANNEL_DEPTH + 10) {
                writer.push(&[0x80, 0x00]);
            }
        });
        producer.join().unwrap();

        // Channel holds at most CHANNEL_DEPTH chunks; the rest were dropped
        assert_eq!(buffer.available(), CHANNEL_DEPTH * 2);
        assert_eq!(buffer.stats().get_chunks_dropped(), 10);
    }
}
