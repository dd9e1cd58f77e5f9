use std::sync::{Mutex, PoisonError};

use super::{max_key_for, Strategy, TallyResults};
use crate::{bits::KmerWord, count::Count, error::KfcError};

/// One counter per possible key, guarded by a single mutex.
#[derive(Debug)]
pub struct DenseStore<K, C> {
    max_key: K,
    tallies: Mutex<Tallies<C>>,
}

#[derive(Debug)]
struct Tallies<C> {
    counts: Vec<C>,
    invalid: C,
}

impl<K: KmerWord, C: Count> DenseStore<K, C> {
    /// Allocates `2^key_bits` zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::OutOfMemory`] if the counters cannot be
    /// allocated, or [`KfcError::CapacityExceeded`] if they cannot even be
    /// addressed on this platform.
    pub fn new(key_bits: u32) -> Result<Self, KfcError> {
        let max_key: K = max_key_for(key_bits)?;
        let bytes = (max_key.to_u64() + 1).saturating_mul(C::bytes());

        let len = max_key
            .to_usize()
            .and_then(|max| max.checked_add(1))
            .ok_or_else(|| {
                KfcError::capacity_exceeded(format!(
                    "vector tally of {bytes} bytes cannot be addressed on this platform"
                ))
            })?;

        let mut counts = Vec::new();
        counts
            .try_reserve_exact(len)
            .map_err(|source| KfcError::OutOfMemory {
                source,
                strategy: Strategy::Vector,
                bytes,
            })?;
        counts.resize(len, C::ZERO);

        Ok(Self {
            max_key,
            tallies: Mutex::new(Tallies {
                counts,
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
            let slot = if key > self.max_key {
                None
            } else {
                key.to_usize().and_then(|index| counts.get_mut(index))
            };
            match slot {
                Some(count) => count.increment(),
                None => invalid.increment(),
            }
        }
    }

    pub fn invalid_count(&self) -> C {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invalid
    }

    pub fn finish(self) -> TallyResults<K, C> {
        let Tallies { counts, invalid } = self
            .tallies
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        TallyResults::from_dense(self.max_key, counts, invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_full_key_space() {
        let store = DenseStore::<u32, u32>::new(10).unwrap();
        assert_eq!(store.max_key(), 1023);
        let results = store.finish();
        assert_eq!(results.iter_with_zeros().count(), 1024);
        assert_eq!(results.iter().count(), 0);
    }

    #[test]
    fn counts_and_invalids() {
        let store = DenseStore::<u64, u64>::new(1).unwrap();
        store.tally(0);
        store.tally_batch(&[1, 1, 2, u64::MAX]);
        assert_eq!(store.invalid_count(), 2);
        let results = store.finish();
        assert_eq!(results.iter().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn concurrent_batches() {
        let store = DenseStore::<u32, u32>::new(8).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        store.tally_batch(&[1, 2, 3]);
                    }
                });
            }
        });
        let results = store.finish();
        assert_eq!(
            results.iter().collect::<Vec<_>>(),
            vec![(1, 400), (2, 400), (3, 400)]
        );
    }
}
