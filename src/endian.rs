//! Byte-order primitives shared by every decoder in this crate.
//!
//! The reference implementation this crate is ported from parameterizes its
//! hot read paths on a `template <bool swap>` argument so the swap branch is
//! resolved once per call graph instead of once per byte. [`SwapPolicy`] is
//! the Rust analogue: a zero-sized marker type selects one of the two
//! monomorphizations at compile time.

use crate::error::Error;

/// Byte order of a serialized stream, as declared by its schema/header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Host byte order, detected at runtime the way the reference
    /// implementation probes `IS_LITTLE_ENDIAN` via a `volatile` read.
    #[inline]
    pub fn host() -> Self {
        if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    /// Whether decoding a stream in `self` order on this host requires a
    /// byte swap on multi-byte values.
    #[inline]
    pub fn needs_swap(self) -> bool {
        self != Endian::host()
    }
}

impl TryFrom<u8> for Endian {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        match code {
            b'<' => Ok(Endian::Little),
            b'>' => Ok(Endian::Big),
            other => Err(Error::argument(format!(
                "invalid byte-order code {other:#x}, expected '<' or '>'"
            ))),
        }
    }
}

/// Selects whether multi-byte reads are byte-swapped after loading, as a
/// compile-time specialization rather than a runtime branch.
pub trait SwapPolicy {
    const SWAP: bool;

    #[inline]
    fn swap_u16(x: u16) -> u16 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_u32(x: u32) -> u32 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_u64(x: u64) -> u64 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_i16(x: i16) -> i16 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_i32(x: i32) -> i32 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_i64(x: i64) -> i64 {
        if Self::SWAP {
            x.swap_bytes()
        } else {
            x
        }
    }

    #[inline]
    fn swap_f32(x: f32) -> f32 {
        if Self::SWAP {
            f32::from_bits(x.to_bits().swap_bytes())
        } else {
            x
        }
    }

    #[inline]
    fn swap_f64(x: f64) -> f64 {
        if Self::SWAP {
            f64::from_bits(x.to_bits().swap_bytes())
        } else {
            x
        }
    }
}

/// No-op specialization: stream order already matches host order.
pub struct NoSwap;
impl SwapPolicy for NoSwap {
    const SWAP: bool = false;
}

/// Byte-swapping specialization: stream order is the opposite of host order.
pub struct DoSwap;
impl SwapPolicy for DoSwap {
    const SWAP: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_try_from_rejects_unknown_code() {
        assert!(Endian::try_from(b'<').is_ok());
        assert!(Endian::try_from(b'>').is_ok());
        assert!(Endian::try_from(b'?').is_err());
    }

    #[test]
    fn needs_swap_is_consistent_with_host() {
        assert!(!Endian::host().needs_swap());
        let other = if Endian::host() == Endian::Little {
            Endian::Big
        } else {
            Endian::Little
        };
        assert!(other.needs_swap());
    }

    #[test]
    fn swap_policies_round_trip() {
        assert_eq!(NoSwap::swap_u32(0x01020304), 0x01020304);
        assert_eq!(DoSwap::swap_u32(0x01020304), 0x04030201);
        assert_eq!(DoSwap::swap_f32(1.0_f32).to_bits(), 1.0_f32.to_bits().swap_bytes());
    }
}
