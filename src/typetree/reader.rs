use byteorder::{ByteOrder, NativeEndian};

use crate::endian::SwapPolicy;
use crate::error::Error;

/// A bounds-checked cursor over an immutable byte slice.
///
/// `start` is implicit (always `0` relative to the slice this cursor was
/// constructed from): a single `Reader` is threaded through one whole
/// top-level [`crate::typetree::read_typetree`] invocation, so `align4`'s
/// "alignment relative to a fixed buffer start" requirement falls out of
/// `position()` directly, without a separate base offset to track.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.pos + n > self.data.len() {
            return Err(Error::bounds(self.pos, n, self.data.len() - self.pos));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16<P: SwapPolicy>(&mut self) -> Result<u16, Error> {
        let buf = self.take(2)?;
        Ok(P::swap_u16(NativeEndian::read_u16(buf)))
    }

    pub fn read_i16<P: SwapPolicy>(&mut self) -> Result<i16, Error> {
        let buf = self.take(2)?;
        Ok(P::swap_i16(NativeEndian::read_i16(buf)))
    }

    pub fn read_u32<P: SwapPolicy>(&mut self) -> Result<u32, Error> {
        let buf = self.take(4)?;
        Ok(P::swap_u32(NativeEndian::read_u32(buf)))
    }

    pub fn read_i32<P: SwapPolicy>(&mut self) -> Result<i32, Error> {
        let buf = self.take(4)?;
        Ok(P::swap_i32(NativeEndian::read_i32(buf)))
    }

    pub fn read_u64<P: SwapPolicy>(&mut self) -> Result<u64, Error> {
        let buf = self.take(8)?;
        Ok(P::swap_u64(NativeEndian::read_u64(buf)))
    }

    pub fn read_i64<P: SwapPolicy>(&mut self) -> Result<i64, Error> {
        let buf = self.take(8)?;
        Ok(P::swap_i64(NativeEndian::read_i64(buf)))
    }

    pub fn read_f32<P: SwapPolicy>(&mut self) -> Result<f32, Error> {
        let buf = self.take(4)?;
        Ok(P::swap_f32(NativeEndian::read_f32(buf)))
    }

    pub fn read_f64<P: SwapPolicy>(&mut self) -> Result<f64, Error> {
        let buf = self.take(8)?;
        Ok(P::swap_f64(NativeEndian::read_f64(buf)))
    }

    /// Reads a raw byte sequence of exactly `n` bytes; never swapped.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        Ok(self.take(n)?.to_vec())
    }

    /// Reads an `i32` length prefix (in `P`'s declared order) followed by
    /// that many raw bytes, tolerating invalid UTF-8 by escaping each bad
    /// byte to a reversible private-use-area code point rather than
    /// discarding it lossily (see [`decode_surrogateescape`]).
    pub fn read_length_prefixed_str<P: SwapPolicy>(&mut self) -> Result<String, Error> {
        let len = self.read_i32::<P>()?;
        if len < 0 {
            return Err(Error::argument(format!("negative string length {len}")));
        }
        let bytes = self.take(len as usize)?;
        Ok(decode_surrogateescape(bytes))
    }

    pub fn read_length_prefixed_bytes<P: SwapPolicy>(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.read_i32::<P>()?;
        if len < 0 {
            return Err(Error::argument(format!("negative byte length {len}")));
        }
        self.read_bytes(len as usize)
    }

    /// Advances the cursor so its offset from the buffer start is a multiple
    /// of 4.
    pub fn align4(&mut self) -> Result<(), Error> {
        let pad = (4 - self.pos % 4) % 4;
        if pad > 0 {
            self.take(pad)?;
        }
        Ok(())
    }
}

/// The reference implementation's `surrogateescape` handler maps each
/// invalid byte to a lone surrogate `0xDC00 + byte`. Rust's `char`/`String`
/// reject the whole surrogate range outright (`char::from_u32` returns
/// `None` for it), so there is no safe way to build that exact value here;
/// escaping into this private-use-area block instead keeps the mapping
/// total, reversible given the same escape convention, and free of any
/// `unsafe` code to bypass `String`'s UTF-8 invariant.
const INVALID_BYTE_ESCAPE_BASE: u32 = 0xF780;

/// Decodes `bytes` as UTF-8, escaping any byte that doesn't decode to
/// `U+F780 + byte` instead of discarding it, so the original bytes can be
/// recovered from the result.
fn decode_surrogateescape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                out.push_str(
                    std::str::from_utf8(&rest[..valid_up_to]).expect("prefix already validated by from_utf8"),
                );

                let bad_byte = rest[valid_up_to];
                let escaped = char::from_u32(INVALID_BYTE_ESCAPE_BASE + u32::from(bad_byte))
                    .expect("0xF780..=0xF87F lies entirely within the private-use area");
                out.push(escaped);

                rest = &rest[valid_up_to + 1..];
            }
        }
    }

    out
}
