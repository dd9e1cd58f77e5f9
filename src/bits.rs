//! Fixed-width bit helpers.
//!
//! K-mer keys are stored in either a `u32` or a `u64`. The [`KmerWord`] trait
//! abstracts over the two so that the codec and the tally stores can be
//! written once and monomorphized per width.
//!
//! The helpers treat the word as a two's complement value whenever sign
//! extension is needed, which is how an invalid k-mer marker is propagated
//! through the encoder without branching.
//!
//! # Example
//!
//! ```rust
//! use kfcount::bits::KmerWord;
//!
//! assert_eq!(u32::low_mask(3), 0b111);
//! assert_eq!(u32::high_mask(2), 0xC000_0000);
//! assert_eq!(0x8000_0000u32.arithmetic_shr(4), 0xF800_0000);
//! assert_eq!(0x8000_0001u32.broadcast_high_bit(), u32::MAX);
//! assert_eq!(0x7FFF_FFFFu32.broadcast_high_bit(), 0);
//! ```

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    ops::{
        BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, ShlAssign, Shr,
        ShrAssign,
    },
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
};

/// An unsigned machine word used as a k-mer key.
pub trait KmerWord:
    Copy
    + Default
    + Eq
    + Ord
    + Hash
    + Debug
    + Display
    + Send
    + Sync
    + 'static
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + BitAndAssign
    + BitOrAssign
    + BitXorAssign
    + ShlAssign<u32>
    + ShrAssign<u32>
{
    /// Width of the word in bits.
    const BITS: u32;
    const ZERO: Self;
    const ONE: Self;
    /// Mask selecting the two bits of a single base.
    const BASE_MASK: Self;
    /// The most significant bit, used as the invalid flag.
    const HIGH_BIT: Self;
    const MAX: Self;

    /// Atomic cell holding one word, used by the lock-free list store.
    type Atomic: AtomicWord<Self>;

    /// The value with the lowest `n` bits set. Saturates to all ones when
    /// `n >= BITS`.
    fn low_mask(n: u32) -> Self;

    /// The value with the highest `n` bits set, built by sign-extending the
    /// high bit. Returns zero for `n == 0` and all ones when `n >= BITS`.
    fn high_mask(n: u32) -> Self;

    /// Right shift that fills vacated bits with a copy of the high bit.
    /// Shift amounts beyond the width are clamped to `BITS - 1`.
    fn arithmetic_shr(self, n: u32) -> Self;

    /// All ones if the high bit is set, all zeros otherwise.
    #[inline]
    fn broadcast_high_bit(self) -> Self {
        self.arithmetic_shr(Self::BITS - 1)
    }

    #[inline]
    fn high_bit_set(self) -> bool {
        self & Self::HIGH_BIT != Self::ZERO
    }

    fn from_u8(value: u8) -> Self;

    /// The two lowest bits as an index in `0..4`.
    fn low_pair(self) -> usize;

    fn to_u64(self) -> u64;

    /// The word as a `usize` index, if it fits on this platform.
    fn to_usize(self) -> Option<usize>;

    /// Builds a word from a `usize` index, if it fits.
    fn from_usize(value: usize) -> Option<Self>;

    /// `self + 1`, or `None` on overflow.
    fn checked_inc(self) -> Option<Self>;

    /// Size of the word in bytes.
    #[inline]
    fn bytes() -> u64 {
        u64::from(Self::BITS / 8)
    }
}

/// A word-sized atomic cell.
///
/// Only relaxed operations are exposed: cells are written by workers and read
/// back after the workers have been joined.
pub trait AtomicWord<T>: Send + Sync + Debug {
    fn new(value: T) -> Self;
    fn load(&self) -> T;
    fn store(&self, value: T);
    /// Consumes the cell. Same size as `T`, so collecting a vector of cells
    /// through this reuses its allocation.
    fn into_inner(self) -> T;
}

macro_rules! impl_kmer_word {
    ($word:ty, $signed:ty, $atomic:ty) => {
        impl KmerWord for $word {
            const BITS: u32 = <$word>::BITS;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const BASE_MASK: Self = 0b11;
            const HIGH_BIT: Self = 1 << (<$word>::BITS - 1);
            const MAX: Self = <$word>::MAX;

            type Atomic = $atomic;

            #[inline]
            fn low_mask(n: u32) -> Self {
                if n >= Self::BITS {
                    Self::MAX
                } else {
                    (1 << n) - 1
                }
            }

            #[inline]
            fn high_mask(n: u32) -> Self {
                match n {
                    0 => 0,
                    n => Self::HIGH_BIT.arithmetic_shr(n - 1),
                }
            }

            #[inline]
            #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
            fn arithmetic_shr(self, n: u32) -> Self {
                ((self as $signed) >> n.min(Self::BITS - 1)) as $word
            }

            #[inline]
            fn from_u8(value: u8) -> Self {
                Self::from(value)
            }

            #[inline]
            #[allow(clippy::cast_possible_truncation)]
            fn low_pair(self) -> usize {
                (self & Self::BASE_MASK) as usize
            }

            #[inline]
            fn to_u64(self) -> u64 {
                u64::from(self)
            }

            #[inline]
            fn to_usize(self) -> Option<usize> {
                usize::try_from(self).ok()
            }

            #[inline]
            fn from_usize(value: usize) -> Option<Self> {
                Self::try_from(value).ok()
            }

            #[inline]
            fn checked_inc(self) -> Option<Self> {
                self.checked_add(1)
            }
        }

        impl AtomicWord<$word> for $atomic {
            #[inline]
            fn new(value: $word) -> Self {
                <$atomic>::new(value)
            }

            #[inline]
            fn load(&self) -> $word {
                <$atomic>::load(self, Ordering::Relaxed)
            }

            #[inline]
            fn store(&self, value: $word) {
                <$atomic>::store(self, value, Ordering::Relaxed);
            }

            #[inline]
            fn into_inner(self) -> $word {
                <$atomic>::into_inner(self)
            }
        }
    };
}

impl_kmer_word!(u32, i32, AtomicU32);
impl_kmer_word!(u64, i64, AtomicU64);
