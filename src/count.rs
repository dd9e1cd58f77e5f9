//! Tally counter types.
//!
//! Counts are either `u32` or `u64`, chosen by the planner independently of
//! the key width. Increments saturate at the type's maximum instead of
//! wrapping, so a pathological input can never panic or roll a large count
//! back to a small one.

use std::fmt::{Debug, Display};

use serde::Serialize;

/// An unsigned counter used for k-mer tallies.
pub trait Count:
    Copy + Default + Eq + Ord + Debug + Display + Send + Sync + Serialize + 'static
{
    const BITS: u32;
    const ZERO: Self;
    const ONE: Self;
    const MAX: Self;

    /// Adds one, saturating at [`Self::MAX`].
    fn increment(&mut self);

    /// Adds `other`, saturating at [`Self::MAX`].
    fn saturating_add(self, other: Self) -> Self;

    /// Converts a run length, saturating at [`Self::MAX`].
    fn from_usize_saturating(value: usize) -> Self;

    /// The count as a `u64`.
    fn widen(self) -> u64;

    /// Size of the counter in bytes.
    #[inline]
    fn bytes() -> u64 {
        u64::from(Self::BITS / 8)
    }
}

macro_rules! impl_count {
    ($count:ty) => {
        impl Count for $count {
            const BITS: u32 = <$count>::BITS;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX: Self = <$count>::MAX;

            #[inline]
            fn increment(&mut self) {
                *self = <$count>::saturating_add(*self, 1);
            }

            #[inline]
            fn saturating_add(self, other: Self) -> Self {
                <$count>::saturating_add(self, other)
            }

            #[inline]
            fn from_usize_saturating(value: usize) -> Self {
                Self::try_from(value).unwrap_or(Self::MAX)
            }

            #[inline]
            fn widen(self) -> u64 {
                u64::from(self)
            }
        }
    };
}

impl_count!(u32);
impl_count!(u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_saturates() {
        let mut c = u32::MAX - 1;
        c.increment();
        assert_eq!(c, u32::MAX);
        c.increment();
        assert_eq!(c, u32::MAX);
    }

    #[test]
    fn add_saturates() {
        assert_eq!(Count::saturating_add(u32::MAX, 5u32), u32::MAX);
        assert_eq!(Count::saturating_add(3u64, 4u64), 7);
    }

    #[test]
    fn from_usize_saturates() {
        assert_eq!(<u32 as Count>::from_usize_saturating(17), 17);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(<u32 as Count>::from_usize_saturating(usize::MAX), u32::MAX);
    }

    #[test]
    fn widen_is_lossless() {
        assert_eq!(u32::MAX.widen(), u64::from(u32::MAX));
        assert_eq!(Count::widen(u64::MAX), u64::MAX);
        assert_eq!(7u32.widen(), 7);
    }
}
