use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use super::{max_key_for, TallyResults};
use crate::{bits::KmerWord, count::Count, error::KfcError};

/// Ordered map from key to counter, guarded by a single mutex.
///
/// Only observed keys take memory, so this suits large key spaces with few
/// distinct k-mers.
#[derive(Debug)]
pub struct MapStore<K, C> {
    max_key: K,
    tallies: Mutex<Tallies<K, C>>,
}

#[derive(Debug)]
struct Tallies<K, C> {
    counts: BTreeMap<K, C>,
    invalid: C,
}

impl<K: KmerWord, C: Count> MapStore<K, C> {
    pub fn new(key_bits: u32) -> Result<Self, KfcError> {
        Ok(Self {
            max_key: max_key_for(key_bits)?,
            tallies: Mutex::new(Tallies {
                counts: BTreeMap::new(),
                invalid: C::ZERO,
            }),
        })
    }

    pub const fn max_key(&self) -> K {
        self.max_key
    }

    pub fn tally(&self, key: K) {
        self.tally_batch(std::slice::from_ref(&key));
    }

    /// Tallies `keys` under one acquisition of the lock.
    pub fn tally_batch(&self, keys: &[K]) {
        let mut guard = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);
        let Tallies { counts, invalid } = &mut *guard;

        for &key in keys {
            if key > self.max_key {
                invalid.increment();
            } else {
                counts.entry(key).or_insert(C::ZERO).increment();
            }
        }
    }

    pub fn invalid_count(&self) -> C {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invalid
    }

    /// Number of distinct keys seen so far.
    pub fn distinct(&self) -> usize {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counts
            .len()
    }

    pub fn finish(self) -> TallyResults<K, C> {
        let Tallies { counts, invalid } = self
            .tallies
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        TallyResults::from_sorted(self.max_key, counts.into_iter().collect(), invalid)
    }
}
