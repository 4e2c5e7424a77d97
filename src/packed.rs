//! Bit-packed integer and normalized-float decoding.
//!
//! Ported from the reference `UnpackInts`/`UnpackFloats` routines: a rolling,
//! little-endian-bit-order cursor over a byte slice, independent of the
//! schema-driven TypeTree reader.

use crate::error::Error;

struct BitCursor<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u32,
}

impl<'a> BitCursor<'a> {
    fn new(data: &'a [u8], start_bit: u64) -> Self {
        Self {
            data,
            byte_pos: (start_bit / 8) as usize,
            bit_pos: (start_bit % 8) as u32,
        }
    }

    /// Reads `bit_size` bits (1..=32), least-significant-bit first, rolling
    /// across byte boundaries exactly like the reference implementation's
    /// `indexPos`/`bitPos` pair.
    fn read_bits(&mut self, bit_size: u8) -> Result<u32, Error> {
        let mut value: u32 = 0;
        let mut bits_read: u32 = 0;
        let bit_size = bit_size as u32;

        while bits_read < bit_size {
            let byte = *self.data.get(self.byte_pos).ok_or_else(|| {
                Error::bounds(self.byte_pos, 1, self.data.len().saturating_sub(self.byte_pos))
            })?;

            value |= (u32::from(byte) >> self.bit_pos) << bits_read;

            let take = (bit_size - bits_read).min(8 - self.bit_pos);
            self.bit_pos += take;
            bits_read += take;

            if self.bit_pos == 8 {
                self.byte_pos += 1;
                self.bit_pos = 0;
            }
        }

        if bit_size < 32 {
            value &= (1u32 << bit_size) - 1;
        }

        Ok(value)
    }
}

/// Extracts `count` unsigned integers packed at `bit_size` bits each,
/// starting at the beginning of `data`.
pub fn unpack_ints(count: u32, data: &[u8], bit_size: u8) -> Result<Vec<u32>, Error> {
    if !(1..=32).contains(&bit_size) {
        return Err(Error::argument(format!(
            "bit_size must be in 1..=32, got {bit_size}"
        )));
    }

    let mut cursor = BitCursor::new(data, 0);
    (0..count).map(|_| cursor.read_bits(bit_size)).collect()
}

/// Extracts bit-packed unsigned integers and maps each to a float in
/// `[start, start + range]`.
///
/// `chunk_stride` only determines how many chunks are produced; the bit
/// cursor itself rolls continuously across the whole call and never seeks
/// per chunk. This mirrors a quirk of the reference `UnpackFloats`
/// implementation, where the chunk/stride bookkeeping cancels out of the
/// loop trip count and never touches `indexPos`/`bitPos`. Reproducing that
/// exactly (rather than a "more sensible" per-chunk seek) is required for
/// bit-exact output.
#[allow(clippy::too_many_arguments)]
pub fn unpack_floats(
    count: u32,
    range: f32,
    start: f32,
    data: &[u8],
    bit_size: u8,
    item_count_in_chunk: u32,
    chunk_stride: u32,
    start_offset: u32,
    num_chunks: i64,
) -> Result<Vec<f32>, Error> {
    if !(1..=32).contains(&bit_size) {
        return Err(Error::argument(format!(
            "bit_size must be in 1..=32, got {bit_size}"
        )));
    }
    if item_count_in_chunk == 0 {
        return Err(Error::argument("item_count_in_chunk must be nonzero"));
    }

    let num_chunks = if num_chunks < 0 {
        (count / item_count_in_chunk) as u64
    } else {
        num_chunks as u64
    };

    let _ = chunk_stride; // trip-count only; see doc comment above.

    let max = if bit_size == 32 {
        u32::MAX
    } else {
        (1u32 << bit_size) - 1
    };

    let mut cursor = BitCursor::new(data, u64::from(bit_size) * u64::from(start_offset));
    let total = num_chunks * u64::from(item_count_in_chunk);

    (0..total)
        .map(|_| {
            let x = cursor.read_bits(bit_size)?;
            Ok(x as f32 * range / max as f32 + start)
        })
        .collect()
}
