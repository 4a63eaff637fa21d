//! Lookup table for 8-bit IQ → complex conversion
//!
//! HackRF delivers interleaved signed 8-bit I/Q bytes. Every possible pair of
//! bytes is read as one 16-bit word, so a 65536-entry table replaces the
//! per-sample int → float conversion with a single index.

use num_complex::Complex32;

/// Number of entries in the table (one per 16-bit word)
pub const LUT_SIZE: usize = 1 << 16;

/// Bytes occupied by one raw complex sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Scale applied to each signed byte. 1/128, not 1/127: the range is
/// [-1.0, 0.9921875].
const SCALE: f32 = 1.0 / 128.0;

/// Which byte of a raw word carries the real part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Low byte is I, high byte is Q
    #[default]
    Little,
    /// High byte is I, low byte is Q
    Big,
}

/// Pre-computed table mapping a raw 16-bit word to a normalized complex sample
pub struct SampleLut {
    table: Vec<Complex32>,
    endianness: Endianness,
}

impl SampleLut {
    /// Build the full table for the given byte order
    pub fn new(endianness: Endianness) -> Self {
        let mut table = Vec::with_capacity(LUT_SIZE);

        for word in 0..LUT_SIZE {
            let lo = signed8(word & 0xFF);
            let hi = signed8(word >> 8);

            let (re, im) = match endianness {
                Endianness::Little => (lo, hi),
                Endianness::Big => (hi, lo),
            };

            table.push(Complex32::new(re, im));
        }

        Self { table, endianness }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Look up a raw 16-bit word
    #[inline(always)]
    pub fn lookup(&self, word: u16) -> Complex32 {
        self.table[word as usize]
    }

    /// Decode the first `n` raw samples of `raw` into `out`.
    ///
    /// Each consecutive byte pair is read as a little-endian u16 and mapped
    /// through the table. The caller guarantees `raw` holds at least
    /// `n * BYTES_PER_SAMPLE` bytes.
    pub fn unpack_into(&self, raw: &[u8], n: usize, out: &mut Vec<Complex32>) {
        out.reserve(n);
        out.extend(
            raw[..n * BYTES_PER_SAMPLE]
                .chunks_exact(BYTES_PER_SAMPLE)
                .map(|pair| self.lookup(u16::from_le_bytes([pair[0], pair[1]]))),
        );
    }

    /// Decode the first `n` raw samples of the byte stream `front ++ back`.
    ///
    /// A sample may straddle the two slices. The caller guarantees they hold
    /// at least `n * BYTES_PER_SAMPLE` bytes together.
    pub fn unpack_split_into(&self, front: &[u8], back: &[u8], n: usize, out: &mut Vec<Complex32>) {
        let from_front = (front.len() / BYTES_PER_SAMPLE).min(n);
        self.unpack_into(front, from_front, out);

        let mut remaining = n - from_front;
        if remaining == 0 {
            return;
        }

        let mut back = back;
        if front.len() % BYTES_PER_SAMPLE != 0 {
            if let (Some(&lo), Some(&hi)) = (front.last(), back.first()) {
                out.push(self.lookup(u16::from_le_bytes([lo, hi])));
                remaining -= 1;
                back = &back[1..];
            }
        }

        self.unpack_into(back, remaining, out);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for SampleLut {
    fn default() -> Self {
        Self::new(Endianness::default())
    }
}

/// Reinterpret the low 8 bits as a two's-complement byte and scale it
#[inline]
fn signed8(x: usize) -> f32 {
    (x as u8 as i8) as f32 * SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(word: usize, endianness: Endianness) -> Complex32 {
        let lo = (word & 0xFF) as u8 as i8 as f32 / 128.0;
        let hi = (word >> 8) as u8 as i8 as f32 / 128.0;
        match endianness {
            Endianness::Little => Complex32::new(lo, hi),
            Endianness::Big => Complex32::new(hi, lo),
        }
    }

    #[test]
    fn test_table_size() {
        let lut = SampleLut::default();
        assert_eq!(lut.len(), 65536);
        assert_eq!(lut.endianness(), Endianness::Little);
    }

    #[test]
    fn test_every_entry_little_endian() {
        let lut = SampleLut::new(Endianness::Little);
        for word in 0..LUT_SIZE {
            assert_eq!(lut.lookup(word as u16), expected(word, Endianness::Little), "word {:#06x}", word);
        }
    }

    #[test]
    fn test_every_entry_big_endian() {
        let lut = SampleLut::new(Endianness::Big);
        for word in 0..LUT_SIZE {
            assert_eq!(lut.lookup(word as u16), expected(word, Endianness::Big), "word {:#06x}", word);
        }
    }

    #[test]
    fn test_spot_values() {
        let lut = SampleLut::new(Endianness::Little);
        assert_eq!(lut.lookup(0x0000), Complex32::new(0.0, 0.0));
        assert_eq!(lut.lookup(0x0080), Complex32::new(-1.0, 0.0));
        assert_eq!(lut.lookup(0xFF7F), Complex32::new(0.9921875, -0.0078125));

        let big = SampleLut::new(Endianness::Big);
        assert_eq!(big.lookup(0x0080), Complex32::new(0.0, -1.0));
    }

    #[test]
    fn test_scaling_is_asymmetric() {
        let lut = SampleLut::new(Endianness::Little);
        // 0x80 → -128/128, 0x7F → 127/128
        assert_eq!(lut.lookup(0x8080).re, -1.0);
        assert_eq!(lut.lookup(0x7F7F).re, 0.9921875);
        assert_eq!(lut.lookup(0x7F7F).im, 0.9921875);
        assert!(lut.lookup(0x7F7F).re < 1.0);
    }

    #[test]
    fn test_unpack_into_preserves_order() {
        let lut = SampleLut::default();
        let raw = hex::decode("80007fff0102").unwrap();
        let mut out = Vec::new();

        lut.unpack_into(&raw, 3, &mut out);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], lut.lookup(0x0080));
        assert_eq!(out[1], lut.lookup(0xFF7F));
        assert_eq!(out[2], lut.lookup(0x0201));
    }

    #[test]
    fn test_unpack_into_ignores_trailing_bytes() {
        let lut = SampleLut::default();
        let raw = [0x7F, 0x00, 0x80];
        let mut out = Vec::new();

        lut.unpack_into(&raw, 1, &mut out);
        assert_eq!(out, vec![Complex32::new(0.9921875, 0.0)]);

        out.clear();
        lut.unpack_into(&raw, 0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_unpack_split_matches_contiguous() {
        let lut = SampleLut::default();
        let raw = hex::decode("80007fff0102fe03").unwrap();
        let mut whole = Vec::new();
        lut.unpack_into(&raw, 4, &mut whole);

        // Every split point, including one inside a sample
        for split in 0..=raw.len() {
            let (front, back) = raw.split_at(split);
            let mut out = Vec::new();
            lut.unpack_split_into(front, back, 4, &mut out);
            assert_eq!(out, whole, "split at {}", split);

            out.clear();
            lut.unpack_split_into(front, back, 1, &mut out);
            assert_eq!(out, whole[..1], "split at {}", split);
        }
    }
}
