//! Single-base encoding.
//!
//! Bases map to two bits: `a`→0, `c`→1, `g`→2, `t`→3 (either case). Every
//! other byte maps to a caller-supplied invalid marker, so the full `u8`
//! range is covered without a bounds check.

use crate::bits::KmerWord;

/// Marks a byte that is not one of `acgtACGT` in [`BASE_CODES`].
const NOT_A_BASE: u8 = 0xFF;

const BASE_CODES: [u8; 256] = {
    let mut table = [NOT_A_BASE; 256];
    table[b'a' as usize] = 0;
    table[b'A' as usize] = 0;
    table[b'c' as usize] = 1;
    table[b'C' as usize] = 1;
    table[b'g' as usize] = 2;
    table[b'G' as usize] = 2;
    table[b't' as usize] = 3;
    table[b'T' as usize] = 3;
    table
};

const BASES: [u8; 4] = *b"acgt";
const COMPLEMENTS: [u8; 4] = *b"tgca";

/// Encodes one byte as a two-bit base value, or `invalid` if it is not a base.
///
/// # Example
///
/// ```rust
/// use kfcount::base::encode_base;
///
/// assert_eq!(encode_base(b'G', u32::MAX), 2);
/// assert_eq!(encode_base(b'n', u32::MAX), u32::MAX);
/// ```
#[inline]
pub fn encode_base<K: KmerWord>(byte: u8, invalid: K) -> K {
    match BASE_CODES[usize::from(byte)] {
        NOT_A_BASE => invalid,
        code => K::from_u8(code),
    }
}

/// Decodes the two low bits of `value` to a lower-case base.
#[inline]
pub fn decode_base<K: KmerWord>(value: K) -> u8 {
    BASES[value.low_pair()]
}

/// Decodes the two low bits of `value` to the complement of its base.
#[inline]
pub fn decode_complement_base<K: KmerWord>(value: K) -> u8 {
    COMPLEMENTS[value.low_pair()]
}

/// Per-codec lookup table with the invalid marker baked in.
#[derive(Debug, Clone)]
pub struct BaseTable<K> {
    codes: [K; 256],
}

impl<K: KmerWord> BaseTable<K> {
    #[must_use]
    pub fn new(invalid: K) -> Self {
        let mut codes = [invalid; 256];
        for (slot, &code) in codes.iter_mut().zip(BASE_CODES.iter()) {
            if code != NOT_A_BASE {
                *slot = K::from_u8(code);
            }
        }
        Self { codes }
    }

    #[inline]
    pub fn encode(&self, byte: u8) -> K {
        self.codes[usize::from(byte)]
    }
}
