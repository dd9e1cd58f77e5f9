use std::iter::{Enumerate, Peekable};

use crate::{bits::KmerWord, count::Count};

/// Finished tally: counts per key in ascending key order, plus the invalid
/// total.
///
/// Iteration does not consume the results, so the sequence can be walked
/// any number of times.
#[derive(Debug, Clone)]
pub struct TallyResults<K, C> {
    max_key: K,
    invalid: C,
    entries: Entries<K, C>,
}

#[derive(Debug, Clone)]
enum Entries<K, C> {
    /// Counter per key, zeros included.
    Dense(Vec<C>),
    /// Observed keys only, ascending, counts non-zero.
    Sparse(Vec<(K, C)>),
}

impl<K: KmerWord, C: Count> TallyResults<K, C> {
    pub(crate) fn from_dense(max_key: K, counts: Vec<C>, invalid: C) -> Self {
        Self {
            max_key,
            invalid,
            entries: Entries::Dense(counts),
        }
    }

    /// `entries` must be sorted by key with no duplicates and no zero counts.
    pub(crate) fn from_sorted(max_key: K, entries: Vec<(K, C)>, invalid: C) -> Self {
        debug_assert!(entries.windows(2).all(|pair| pair[0].0 < pair[1].0));
        Self {
            max_key,
            invalid,
            entries: Entries::Sparse(entries),
        }
    }

    /// The largest valid key.
    pub const fn max_key(&self) -> K {
        self.max_key
    }

    /// Number of invalid k-mers tallied.
    pub const fn invalid_count(&self) -> C {
        self.invalid
    }

    /// Observed keys and their counts, ascending by key.
    pub fn iter(&self) -> Iter<'_, K, C> {
        let inner = match &self.entries {
            Entries::Dense(counts) => IterInner::Dense(counts.iter().enumerate()),
            Entries::Sparse(entries) => IterInner::Sparse(entries.iter()),
        };
        Iter { inner }
    }

    /// Every key from zero to [`max_key`](Self::max_key), with a zero count
    /// for keys that were never observed.
    pub fn iter_with_zeros(&self) -> IterWithZeros<'_, K, C> {
        IterWithZeros {
            next_key: Some(K::ZERO),
            max_key: self.max_key,
            observed: self.iter().peekable(),
        }
    }

    /// Number of distinct keys observed.
    pub fn distinct(&self) -> usize {
        match &self.entries {
            Entries::Dense(counts) => counts.iter().filter(|&&count| count != C::ZERO).count(),
            Entries::Sparse(entries) => entries.len(),
        }
    }

    /// Sum of all valid counts.
    pub fn total(&self) -> u64 {
        self.iter()
            .fold(0u64, |total, (_, count)| total.saturating_add(count.widen()))
    }

    /// Count for `key`, zero if unobserved.
    pub fn get(&self, key: K) -> C {
        match &self.entries {
            Entries::Dense(counts) => key
                .to_usize()
                .and_then(|index| counts.get(index))
                .copied()
                .unwrap_or(C::ZERO),
            Entries::Sparse(entries) => entries
                .binary_search_by_key(&key, |&(key, _)| key)
                .ok()
                .and_then(|index| entries.get(index))
                .map_or(C::ZERO, |&(_, count)| count),
        }
    }
}

impl<'a, K: KmerWord, C: Count> IntoIterator for &'a TallyResults<K, C> {
    type Item = (K, C);
    type IntoIter = Iter<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over observed keys. See [`TallyResults::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a, K, C> {
    inner: IterInner<'a, K, C>,
}

#[derive(Debug, Clone)]
enum IterInner<'a, K, C> {
    Dense(Enumerate<std::slice::Iter<'a, C>>),
    Sparse(std::slice::Iter<'a, (K, C)>),
}

impl<K: KmerWord, C: Count> Iterator for Iter<'_, K, C> {
    type Item = (K, C);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Dense(counts) => counts
                .find(|&(_, &count)| count != C::ZERO)
                .and_then(|(index, &count)| K::from_usize(index).map(|key| (key, count))),
            IterInner::Sparse(entries) => entries.next().copied(),
        }
    }
}

/// Iterator over every key including zero counts. See
/// [`TallyResults::iter_with_zeros`].
#[derive(Debug, Clone)]
pub struct IterWithZeros<'a, K: KmerWord, C: Count> {
    next_key: Option<K>,
    max_key: K,
    observed: Peekable<Iter<'a, K, C>>,
}

impl<K: KmerWord, C: Count> Iterator for IterWithZeros<'_, K, C> {
    type Item = (K, C);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next_key.filter(|&key| key <= self.max_key)?;

        let count = match self.observed.peek() {
            Some(&(observed, count)) if observed == key => {
                self.observed.next();
                count
            }
            _ => C::ZERO,
        };

        self.next_key = if key == self.max_key {
            None
        } else {
            key.checked_inc()
        };

        Some((key, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_and_sparse_agree() {
        let dense = TallyResults::<u32, u32>::from_dense(3, vec![0, 4, 0, 1], 2);
        let sparse = TallyResults::<u32, u32>::from_sorted(3, vec![(1, 4), (3, 1)], 2);

        assert_eq!(dense.iter().collect::<Vec<_>>(), sparse.iter().collect::<Vec<_>>());
        assert_eq!(
            dense.iter_with_zeros().collect::<Vec<_>>(),
            sparse.iter_with_zeros().collect::<Vec<_>>()
        );
        assert_eq!(dense.distinct(), 2);
        assert_eq!(sparse.total(), 5);
        assert_eq!(dense.get(1), 4);
        assert_eq!(sparse.get(2), 0);
        assert_eq!(sparse.get(3), 1);
    }

    #[test]
    fn zeros_cover_whole_key_space() {
        let results = TallyResults::<u64, u64>::from_sorted(7, vec![(7, 9)], 0);
        let all: Vec<_> = results.iter_with_zeros().collect();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], (0, 0));
        assert_eq!(all[7], (7, 9));
    }

    #[test]
    fn empty_results() {
        let results = TallyResults::<u32, u32>::from_sorted(1, Vec::new(), 0);
        assert_eq!(results.iter().count(), 0);
        assert_eq!(results.iter_with_zeros().collect::<Vec<_>>(), vec![(0, 0), (1, 0)]);
        assert_eq!(results.total(), 0);
    }

    #[test]
    fn into_iterator_for_reference() {
        let results = TallyResults::<u32, u32>::from_dense(1, vec![1, 1], 0);
        let mut seen = 0;
        for (_, count) in &results {
            seen += count;
        }
        assert_eq!(seen, 2);
    }
}
