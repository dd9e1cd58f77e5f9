//! K-mer tallies.
//!
//! A tally accumulates a count per key plus a single count of invalid keys,
//! i.e. keys greater than the store's maximum key. Three strategies trade
//! memory for speed:
//!
//! - [`DenseStore`]: one counter per possible key, indexed directly. Memory
//!   depends only on the key width.
//! - [`MapStore`]: an ordered map from key to counter. Memory grows with the
//!   number of distinct keys.
//! - [`ListStore`]: raw keys appended lock-free, sorted and run-length
//!   encoded when the run finishes. Memory grows with the number of keys.
//!
//! [`Store`] wraps the three so the strategy is picked once, at
//! construction, and matched once per batch of keys.
//!
//! # Example
//!
//! ```rust
//! use kfcount::tally::Store;
//!
//! let store = Store::<u32, u32>::dense(3)?;
//! store.tally_batch(&[1, 5, 5, 200])?;
//!
//! let results = store.finish()?;
//! assert_eq!(results.iter().collect::<Vec<_>>(), vec![(1, 1), (5, 2)]);
//! assert_eq!(results.invalid_count(), 1);
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

mod dense;
mod list;
mod map;
mod results;

use clap::ValueEnum;
use serde::Serialize;

pub use dense::DenseStore;
pub use list::ListStore;
pub use map::MapStore;
pub use results::{Iter, IterWithZeros, TallyResults};

use crate::{bits::KmerWord, count::Count, error::KfcError};

/// Tally strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Dense vector of counters indexed by key.
    Vector,
    /// Ordered map from key to counter.
    Map,
    /// Raw key list, sorted and counted at the end.
    List,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Map => write!(f, "map"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Largest valid key for `key_bits`-bit keys in a `K` word.
///
/// The high bit of `K` is reserved for invalid keys, so `key_bits` must be
/// below the word width.
pub(crate) fn max_key_for<K: KmerWord>(key_bits: u32) -> Result<K, KfcError> {
    if key_bits == 0 || key_bits >= K::BITS {
        return Err(KfcError::invalid_parameter(format!(
            "invalid number of key bits {key_bits}: must be between 1 and {} for {}-bit keys",
            K::BITS - 1,
            K::BITS
        )));
    }
    Ok(K::low_mask(key_bits))
}

/// A tally store of any strategy.
#[derive(Debug)]
pub enum Store<K: KmerWord, C: Count> {
    Dense(DenseStore<K, C>),
    Map(MapStore<K, C>),
    List(ListStore<K>),
}

impl<K: KmerWord, C: Count> Store<K, C> {
    /// Creates a dense store for `key_bits`-bit keys.
    pub fn dense(key_bits: u32) -> Result<Self, KfcError> {
        DenseStore::new(key_bits).map(Self::Dense)
    }

    /// Creates a map store for `key_bits`-bit keys.
    pub fn map(key_bits: u32) -> Result<Self, KfcError> {
        MapStore::new(key_bits).map(Self::Map)
    }

    /// Creates a list store for `key_bits`-bit keys holding at most
    /// `capacity` keys.
    pub fn list(key_bits: u32, capacity: u64) -> Result<Self, KfcError> {
        ListStore::new(key_bits, capacity).map(Self::List)
    }

    /// Creates a store of the given strategy.
    pub fn with_strategy(
        strategy: Strategy,
        key_bits: u32,
        list_capacity: u64,
    ) -> Result<Self, KfcError> {
        match strategy {
            Strategy::Vector => Self::dense(key_bits),
            Strategy::Map => Self::map(key_bits),
            Strategy::List => Self::list(key_bits, list_capacity),
        }
    }

    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Dense(_) => Strategy::Vector,
            Self::Map(_) => Strategy::Map,
            Self::List(_) => Strategy::List,
        }
    }

    pub const fn max_key(&self) -> K {
        match self {
            Self::Dense(store) => store.max_key(),
            Self::Map(store) => store.max_key(),
            Self::List(store) => store.max_key(),
        }
    }

    /// Tallies a single key.
    pub fn tally(&self, key: K) -> Result<(), KfcError> {
        self.tally_batch(std::slice::from_ref(&key))
    }

    /// Tallies every key in `keys`.
    ///
    /// # Errors
    ///
    /// Only the list strategy can fail, with
    /// [`KfcError::CapacityExhausted`] once its capacity is used up.
    pub fn tally_batch(&self, keys: &[K]) -> Result<(), KfcError> {
        match self {
            Self::Dense(store) => {
                store.tally_batch(keys);
                Ok(())
            }
            Self::Map(store) => {
                store.tally_batch(keys);
                Ok(())
            }
            Self::List(store) => store.tally_batch(keys),
        }
    }

    /// Invalid keys tallied so far.
    pub fn invalid_count(&self) -> C {
        match self {
            Self::Dense(store) => store.invalid_count(),
            Self::Map(store) => store.invalid_count(),
            Self::List(store) => C::from_usize_saturating(store.invalid_len()),
        }
    }

    /// Consumes the store and produces its sorted results.
    pub fn finish(self) -> Result<TallyResults<K, C>, KfcError> {
        match self {
            Self::Dense(store) => Ok(store.finish()),
            Self::Map(store) => Ok(store.finish()),
            Self::List(store) => Ok(store.finish()),
        }
    }
}
