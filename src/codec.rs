//! Bit-packed k-mer encoding and decoding.
//!
//! A [`KmerCodec`] maps windows of `k` bases to integer keys and back. Two
//! encodings are supported:
//!
//! - **single strand**: every base takes two bits, most significant first,
//!   so a key uses `2k` bits and a k-mer and its reverse complement are
//!   distinct keys;
//! - **canonical** (double strand): the orientation whose middle base is `a`
//!   or `c` is encoded, and that middle base takes a single bit. A key uses
//!   `2k - 1` bits and a k-mer and its reverse complement share one key.
//!   Canonical encoding needs a middle base, so `k` must be odd.
//!
//! Any window containing a byte outside `acgtACGT` encodes to a key with the
//! high bit set. Such keys are always greater than [`KmerCodec::max_key`], so
//! they sort after every valid key and are recognised by a single comparison.
//!
//! # Example
//!
//! ```rust
//! use kfcount::codec::KmerCodec;
//!
//! let codec = KmerCodec::<u32>::new(3, false)?;
//! assert_eq!(codec.encode(b"acgtca"), vec![6, 6, 17, 28]);
//! assert_eq!(codec.decode(17), "gac");
//!
//! let codec = KmerCodec::<u32>::new(3, true)?;
//! assert_eq!(codec.encode(b"acgtca"), vec![6, 27, 45, 52]);
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

use crate::{
    base::{decode_base, decode_complement_base, BaseTable},
    bits::KmerWord,
    error::KfcError,
};

/// Encoder and decoder for k-mers of a fixed size and strand mode.
#[derive(Debug, Clone)]
pub struct KmerCodec<K: KmerWord> {
    ksize: u32,
    single_strand: bool,
    key_bits: u32,
    max_key: K,
    /// High `2k` bits set: survives the `k - 1` shifts that follow it.
    invalid: K,
    table: BaseTable<K>,
}

impl<K: KmerWord> KmerCodec<K> {
    /// Largest k-mer size whose keys leave the high bit free.
    pub const MAX_KSIZE: u32 = (K::BITS - 1) / 2;

    /// Creates a codec for k-mers of `ksize` bases.
    ///
    /// # Arguments
    ///
    /// * `ksize` - K-mer size, `1..=MAX_KSIZE`
    /// * `single_strand` - `true` to keep a k-mer and its reverse complement
    ///   apart, `false` for canonical keys
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::InvalidParameter`] if `ksize` is zero, too large
    /// for the key width, or even while canonical encoding is requested.
    pub fn new(ksize: usize, single_strand: bool) -> Result<Self, KfcError> {
        let ksize = u32::try_from(ksize)
            .ok()
            .filter(|&k| (1..=Self::MAX_KSIZE).contains(&k))
            .ok_or_else(|| {
                KfcError::invalid_parameter(format!(
                    "invalid k-mer size {ksize}: must be between 1 and {} for {}-bit keys",
                    Self::MAX_KSIZE,
                    K::BITS
                ))
            })?;

        if !single_strand && ksize % 2 == 0 {
            return Err(KfcError::invalid_parameter(format!(
                "k-mer size {ksize} must be odd for canonical counting; use single strand mode for even sizes"
            )));
        }

        let key_bits = 2 * ksize - u32::from(!single_strand);
        let invalid = K::high_mask(2 * ksize);

        Ok(Self {
            ksize,
            single_strand,
            key_bits,
            max_key: K::low_mask(key_bits),
            invalid,
            table: BaseTable::new(invalid),
        })
    }

    pub const fn ksize(&self) -> usize {
        self.ksize as usize
    }

    pub const fn single_strand(&self) -> bool {
        self.single_strand
    }

    /// Number of significant bits in a valid key.
    pub const fn key_bits(&self) -> u32 {
        self.key_bits
    }

    /// The largest valid key.
    pub const fn max_key(&self) -> K {
        self.max_key
    }

    /// The marker produced for a window of invalid bases.
    pub const fn invalid_marker(&self) -> K {
        self.invalid
    }

    /// Key under which the invalid total is reported: one past
    /// [`max_key`](Self::max_key).
    pub fn invalid_key(&self) -> u64 {
        self.max_key.to_u64() + 1
    }

    #[inline]
    pub fn is_invalid(&self, key: K) -> bool {
        key > self.max_key
    }

    /// Number of keys `seq` encodes to.
    #[inline]
    pub const fn window_count(&self, seq: &[u8]) -> usize {
        (seq.len() + 1).saturating_sub(self.ksize as usize)
    }

    #[inline]
    fn push_base(&self, kmer: K, byte: u8) -> K {
        (kmer << 2) | self.table.encode(byte)
    }

    /// Single-strand encodes the first `k` bases of `window`.
    ///
    /// Returns a key with the high bit set if the window contains an invalid
    /// base or is shorter than `k`.
    pub fn ss_encode_one(&self, window: &[u8]) -> K {
        let Some(window) = window.get(..self.ksize()) else {
            return self.invalid;
        };

        window
            .iter()
            .fold(K::ZERO, |kmer, &byte| self.push_base(kmer, byte))
    }

    /// Single-strand encodes every window of `seq`.
    pub fn ss_encode(&self, seq: &[u8]) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.window_count(seq));
        self.ss_encode_into(seq, &mut keys);
        keys
    }

    /// Rolling single-strand encode of every window of `seq` into `keys`.
    ///
    /// `keys` is cleared first. Each new base costs a constant amount of
    /// work. An invalid base resets the key to the invalid marker, whose
    /// `2k` high bits keep the high bit set for exactly the `k` windows that
    /// cover it.
    pub fn ss_encode_into(&self, seq: &[u8], keys: &mut Vec<K>) {
        keys.clear();

        let k = self.ksize();
        if seq.len() < k {
            return;
        }
        keys.reserve(self.window_count(seq));

        let (head, tail) = seq.split_at(k);

        let mut kmer = head.iter().fold(K::ZERO, |kmer, &byte| self.roll(kmer, byte));
        keys.push(kmer);

        // Keeps the 2k-2 bits that stay in the window, or everything when
        // the high bit is set.
        let retain_shift = K::BITS - 2 * self.ksize + 1;

        for &byte in tail {
            kmer &= (kmer | !K::HIGH_BIT).arithmetic_shr(retain_shift);
            kmer = self.roll(kmer, byte);
            keys.push(kmer);
        }
    }

    #[inline]
    fn roll(&self, kmer: K, byte: u8) -> K {
        let base = self.table.encode(byte);
        ((kmer << 2) & !base.broadcast_high_bit()) | base
    }

    /// Canonically encodes the first `k` bases of `window`.
    ///
    /// A window whose middle base is `a` or `c` is encoded forward. Otherwise
    /// its reverse complement is encoded, so that both strands yield the
    /// same key.
    pub fn ds_encode_one(&self, window: &[u8]) -> K {
        let k = self.ksize();
        let Some(window) = window.get(..k) else {
            return self.invalid;
        };

        let mid = k / 2;
        let (before, rest) = window.split_at(mid);
        let Some((&middle, after)) = rest.split_first() else {
            return self.invalid;
        };
        let middle = self.table.encode(middle);

        if (middle >> 1) & K::ONE == K::ZERO {
            // a, c or invalid
            let kmer = before
                .iter()
                .fold(K::ZERO, |kmer, &byte| self.push_base(kmer, byte));
            let kmer = (kmer << 1) | middle;
            after
                .iter()
                .fold(kmer, |kmer, &byte| self.push_base(kmer, byte))
        } else {
            let kmer = after
                .iter()
                .rev()
                .fold(K::ZERO, |kmer, &byte| self.push_base(kmer, byte));
            let kmer = (kmer << 1) | (middle & K::ONE);
            let kmer = before
                .iter()
                .rev()
                .fold(kmer, |kmer, &byte| self.push_base(kmer, byte));
            kmer ^ K::low_mask(2 * self.ksize - 1)
        }
    }

    /// Canonically encodes every window of `seq`.
    pub fn ds_encode(&self, seq: &[u8]) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.window_count(seq));
        self.ds_encode_into(seq, &mut keys);
        keys
    }

    /// Canonically encodes every window of `seq` into `keys`, clearing it
    /// first.
    pub fn ds_encode_into(&self, seq: &[u8], keys: &mut Vec<K>) {
        keys.clear();
        keys.extend(
            seq.windows(self.ksize())
                .map(|window| self.ds_encode_one(window)),
        );
    }

    /// Encodes one window in this codec's strand mode.
    #[inline]
    pub fn encode_one(&self, window: &[u8]) -> K {
        if self.single_strand {
            self.ss_encode_one(window)
        } else {
            self.ds_encode_one(window)
        }
    }

    /// Encodes every window of `seq` in this codec's strand mode.
    pub fn encode(&self, seq: &[u8]) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.window_count(seq));
        self.encode_into(seq, &mut keys);
        keys
    }

    /// Encodes every window of `seq` into `keys`, clearing it first.
    pub fn encode_into(&self, seq: &[u8], keys: &mut Vec<K>) {
        if self.single_strand {
            self.ss_encode_into(seq, keys);
        } else {
            self.ds_encode_into(seq, keys);
        }
    }

    /// Reverse complement of a single-strand key.
    ///
    /// The high bit of the input is carried over, so an invalid key stays
    /// invalid.
    pub fn ss_revcomp(&self, key: K) -> K {
        let mut rest = key ^ K::low_mask(2 * self.ksize);
        let mut out = K::ZERO;

        for _ in 0..self.ksize {
            out = (out << 2) | (rest & K::BASE_MASK);
            rest = rest.arithmetic_shr(2);
        }

        out | (rest & K::HIGH_BIT)
    }

    /// Converts a single-strand key to the canonical key of the same k-mer.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::InvalidParameter`] when `k` is even, as there is
    /// no middle base to orient on.
    pub fn ss_to_ds(&self, key: K) -> Result<K, KfcError> {
        let k = self.ksize;
        if k % 2 == 0 {
            return Err(KfcError::invalid_parameter(format!(
                "cannot convert to canonical keys: k-mer size {k} is even"
            )));
        }

        // Bit k is the high bit of the middle base.
        let oriented = if (key >> k) & K::ONE == K::ONE {
            self.ss_revcomp(key)
        } else {
            key
        };

        let half = K::low_mask(k);
        Ok(((oriented & (half << k)) >> 1) | (oriented & (K::HIGH_BIT | half)))
    }

    /// Decodes a single-strand key, optionally as its reverse complement.
    ///
    /// Keys outside the single-strand key space decode to `k` `X`s.
    pub fn ss_decode(&self, key: K, reverse_complement: bool) -> String {
        let mut dna = vec![b'X'; self.ksize()];

        if key <= K::low_mask(2 * self.ksize) {
            let mut key = key;
            if reverse_complement {
                for slot in &mut dna {
                    *slot = decode_complement_base(key);
                    key >>= 2;
                }
            } else {
                for slot in dna.iter_mut().rev() {
                    *slot = decode_base(key);
                    key >>= 2;
                }
            }
        }

        dna.into_iter().map(char::from).collect()
    }

    /// Decodes a canonical key, optionally as its reverse complement.
    ///
    /// Keys outside the canonical key space decode to `k` `X`s.
    pub fn ds_decode(&self, key: K, reverse_complement: bool) -> String {
        let k = self.ksize();
        let mid = k / 2;
        let mut dna = vec![b'X'; k];

        if key <= K::low_mask(2 * self.ksize - 1) {
            let mut key = key;
            let (before, rest) = dna.split_at_mut(mid);
            if let Some((middle, after)) = rest.split_first_mut() {
                if reverse_complement {
                    for slot in before {
                        *slot = decode_complement_base(key);
                        key >>= 2;
                    }
                    *middle = decode_complement_base(key & K::ONE);
                    key >>= 1;
                    for slot in after {
                        *slot = decode_complement_base(key);
                        key >>= 2;
                    }
                } else {
                    for slot in after.iter_mut().rev() {
                        *slot = decode_base(key);
                        key >>= 2;
                    }
                    *middle = decode_base(key & K::ONE);
                    key >>= 1;
                    for slot in before.iter_mut().rev() {
                        *slot = decode_base(key);
                        key >>= 2;
                    }
                }
            }
        }

        dna.into_iter().map(char::from).collect()
    }

    /// Decodes a key in this codec's strand mode.
    pub fn decode(&self, key: K) -> String {
        self.decode_oriented(key, false)
    }

    /// Decodes a key in this codec's strand mode, optionally as its reverse
    /// complement.
    pub fn decode_oriented(&self, key: K, reverse_complement: bool) -> String {
        if self.single_strand {
            self.ss_decode(key, reverse_complement)
        } else {
            self.ds_decode(key, reverse_complement)
        }
    }
}
