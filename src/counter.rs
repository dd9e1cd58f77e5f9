//! Codec-bound tally engines.
//!
//! [`KmerCounter`] pairs a [`KmerCodec`] with a [`Store`] of the same key
//! width: sequences go in, encoded keys are tallied in one batch per
//! sequence. [`Counter`] closes over the four supported combinations of key
//! and count width so callers can hold one without being generic; the match
//! happens once per sequence, never per key.
//!
//! # Example
//!
//! ```rust
//! use kfcount::{counter::KmerCounter, tally::Strategy};
//!
//! let counter = KmerCounter::<u32, u32>::with_strategy(3, false, Strategy::Map, 0)?;
//! counter.process(b"acgtca")?;
//!
//! let counts = counter.finish()?;
//! let rows: Vec<_> = counts.results().iter().collect();
//! assert_eq!(rows, vec![(6, 2), (17, 1), (28, 1)]);
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

use std::io::Write;

use serde::Serialize;

use crate::{
    bits::KmerWord,
    codec::KmerCodec,
    count::Count,
    error::KfcError,
    report::{write_counts, ReportOptions},
    tally::{Store, Strategy, TallyResults},
};

/// Width of a key or count word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Width {
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl Width {
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    pub const fn bytes(self) -> u64 {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }
}

impl std::fmt::Display for Width {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// A tally store bound to the codec that produces its keys.
#[derive(Debug)]
pub struct KmerCounter<K: KmerWord, C: Count> {
    codec: KmerCodec<K>,
    store: Store<K, C>,
}

impl<K: KmerWord, C: Count> KmerCounter<K, C> {
    /// Binds `codec` to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::InvalidParameter`] if the store was sized for a
    /// different key space than the codec produces.
    pub fn new(codec: KmerCodec<K>, store: Store<K, C>) -> Result<Self, KfcError> {
        if codec.max_key() != store.max_key() {
            return Err(KfcError::invalid_parameter(format!(
                "tally sized for maximum key {} cannot hold {}-mer keys up to {}",
                store.max_key(),
                codec.ksize(),
                codec.max_key()
            )));
        }
        Ok(Self { codec, store })
    }

    /// Creates a codec and a store of `strategy` for it.
    ///
    /// # Arguments
    ///
    /// * `ksize` - K-mer size
    /// * `single_strand` - `false` for canonical keys
    /// * `strategy` - Tally strategy
    /// * `list_capacity` - Maximum number of k-mers for the list strategy,
    ///   ignored by the others
    pub fn with_strategy(
        ksize: usize,
        single_strand: bool,
        strategy: Strategy,
        list_capacity: u64,
    ) -> Result<Self, KfcError> {
        let codec = KmerCodec::new(ksize, single_strand)?;
        let store = Store::with_strategy(strategy, codec.key_bits(), list_capacity)?;
        Self::new(codec, store)
    }

    pub const fn codec(&self) -> &KmerCodec<K> {
        &self.codec
    }

    pub const fn strategy(&self) -> Strategy {
        self.store.strategy()
    }

    /// Encodes `seq` and tallies its k-mers.
    pub fn process(&self, seq: &[u8]) -> Result<(), KfcError> {
        let mut keys = Vec::new();
        self.process_with(seq, &mut keys)
    }

    /// Like [`process`](Self::process), reusing `keys` as scratch space.
    pub fn process_with(&self, seq: &[u8], keys: &mut Vec<K>) -> Result<(), KfcError> {
        self.codec.encode_into(seq, keys);
        self.store.tally_batch(keys)
    }

    /// Invalid k-mers tallied so far.
    pub fn invalid_count(&self) -> C {
        self.store.invalid_count()
    }

    pub fn finish(self) -> Result<KmerCounts<K, C>, KfcError> {
        Ok(KmerCounts {
            results: self.store.finish()?,
            codec: self.codec,
        })
    }
}

/// Finished counts together with the codec needed to render their keys.
#[derive(Debug, Clone)]
pub struct KmerCounts<K: KmerWord, C: Count> {
    codec: KmerCodec<K>,
    results: TallyResults<K, C>,
}

impl<K: KmerWord, C: Count> KmerCounts<K, C> {
    pub const fn codec(&self) -> &KmerCodec<K> {
        &self.codec
    }

    pub const fn results(&self) -> &TallyResults<K, C> {
        &self.results
    }
}

/// Per-worker scratch space for encoded keys.
#[derive(Debug, Default)]
pub struct KeyBuffer {
    narrow: Vec<u32>,
    wide: Vec<u64>,
}

/// A counter of any supported key and count width.
///
/// Variants are named key width first: `U64U32` has 64-bit keys and 32-bit
/// counts.
#[derive(Debug)]
pub enum Counter {
    U32U32(KmerCounter<u32, u32>),
    U32U64(KmerCounter<u32, u64>),
    U64U32(KmerCounter<u64, u32>),
    U64U64(KmerCounter<u64, u64>),
}

macro_rules! dispatch {
    ($kind:ident, $value:expr, $inner:ident => $body:expr) => {
        match $value {
            $kind::U32U32($inner) => $body,
            $kind::U32U64($inner) => $body,
            $kind::U64U32($inner) => $body,
            $kind::U64U64($inner) => $body,
        }
    };
}

impl Counter {
    /// Creates a counter with the given widths and strategy.
    pub fn new(
        ksize: usize,
        single_strand: bool,
        strategy: Strategy,
        key_width: Width,
        count_width: Width,
        list_capacity: u64,
    ) -> Result<Self, KfcError> {
        Ok(match (key_width, count_width) {
            (Width::Bits32, Width::Bits32) => Self::U32U32(KmerCounter::with_strategy(
                ksize,
                single_strand,
                strategy,
                list_capacity,
            )?),
            (Width::Bits32, Width::Bits64) => Self::U32U64(KmerCounter::with_strategy(
                ksize,
                single_strand,
                strategy,
                list_capacity,
            )?),
            (Width::Bits64, Width::Bits32) => Self::U64U32(KmerCounter::with_strategy(
                ksize,
                single_strand,
                strategy,
                list_capacity,
            )?),
            (Width::Bits64, Width::Bits64) => Self::U64U64(KmerCounter::with_strategy(
                ksize,
                single_strand,
                strategy,
                list_capacity,
            )?),
        })
    }

    pub fn ksize(&self) -> usize {
        dispatch!(Self, self, counter => counter.codec().ksize())
    }

    pub fn single_strand(&self) -> bool {
        dispatch!(Self, self, counter => counter.codec().single_strand())
    }

    pub fn strategy(&self) -> Strategy {
        dispatch!(Self, self, counter => counter.strategy())
    }

    pub const fn key_width(&self) -> Width {
        match self {
            Self::U32U32(_) | Self::U32U64(_) => Width::Bits32,
            Self::U64U32(_) | Self::U64U64(_) => Width::Bits64,
        }
    }

    pub const fn count_width(&self) -> Width {
        match self {
            Self::U32U32(_) | Self::U64U32(_) => Width::Bits32,
            Self::U32U64(_) | Self::U64U64(_) => Width::Bits64,
        }
    }

    /// Encodes `seq` and tallies its k-mers.
    pub fn process(&self, seq: &[u8]) -> Result<(), KfcError> {
        self.process_with(seq, &mut KeyBuffer::default())
    }

    /// Like [`process`](Self::process), reusing a per-worker buffer.
    pub fn process_with(&self, seq: &[u8], buffer: &mut KeyBuffer) -> Result<(), KfcError> {
        match self {
            Self::U32U32(counter) => counter.process_with(seq, &mut buffer.narrow),
            Self::U32U64(counter) => counter.process_with(seq, &mut buffer.narrow),
            Self::U64U32(counter) => counter.process_with(seq, &mut buffer.wide),
            Self::U64U64(counter) => counter.process_with(seq, &mut buffer.wide),
        }
    }

    /// Invalid k-mers tallied so far.
    pub fn invalid_count(&self) -> u64 {
        dispatch!(Self, self, counter => counter.invalid_count().widen())
    }

    pub fn finish(self) -> Result<Counts, KfcError> {
        Ok(match self {
            Self::U32U32(counter) => Counts::U32U32(counter.finish()?),
            Self::U32U64(counter) => Counts::U32U64(counter.finish()?),
            Self::U64U32(counter) => Counts::U64U32(counter.finish()?),
            Self::U64U64(counter) => Counts::U64U64(counter.finish()?),
        })
    }
}

/// Finished counts of any supported key and count width.
#[derive(Debug, Clone)]
pub enum Counts {
    U32U32(KmerCounts<u32, u32>),
    U32U64(KmerCounts<u32, u64>),
    U64U32(KmerCounts<u64, u32>),
    U64U64(KmerCounts<u64, u64>),
}

impl Counts {
    pub fn ksize(&self) -> usize {
        dispatch!(Self, self, counts => counts.codec().ksize())
    }

    pub fn single_strand(&self) -> bool {
        dispatch!(Self, self, counts => counts.codec().single_strand())
    }

    pub fn invalid_count(&self) -> u64 {
        dispatch!(Self, self, counts => counts.results().invalid_count().widen())
    }

    /// Number of distinct valid k-mers.
    pub fn distinct(&self) -> usize {
        dispatch!(Self, self, counts => counts.results().distinct())
    }

    /// Sum of all valid k-mer counts.
    pub fn total(&self) -> u64 {
        dispatch!(Self, self, counts => counts.results().total())
    }

    /// `(key, count)` pairs in ascending key order, optionally including
    /// every unobserved key with a zero count.
    pub fn pairs(&self, zeros: bool) -> Box<dyn Iterator<Item = (u64, u64)> + '_> {
        dispatch!(Self, self, counts => widened_pairs(counts.results(), zeros))
    }

    /// `(k-mer, count)` pairs of observed k-mers in ascending key order.
    pub fn kmers(&self) -> Vec<(String, u64)> {
        dispatch!(Self, self, counts => counts
            .results()
            .iter()
            .map(|(key, count)| (counts.codec().decode(key), count.widen()))
            .collect())
    }

    /// Writes a report of the counts to `out`.
    pub fn write<W: Write>(&self, out: &mut W, options: &ReportOptions) -> Result<(), KfcError> {
        dispatch!(Self, self, counts => write_counts(out, counts, options))
    }
}

fn widened_pairs<K: KmerWord, C: Count>(
    results: &TallyResults<K, C>,
    zeros: bool,
) -> Box<dyn Iterator<Item = (u64, u64)> + '_> {
    if zeros {
        Box::new(
            results
                .iter_with_zeros()
                .map(|(key, count)| (key.to_u64(), count.widen())),
        )
    } else {
        Box::new(
            results
                .iter()
                .map(|(key, count)| (key.to_u64(), count.widen())),
        )
    }
}
