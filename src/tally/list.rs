use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        OnceLock,
    },
};

use rayon::slice::ParallelSliceMut;

use super::{max_key_for, Strategy, TallyResults};
use crate::{
    bits::{AtomicWord, KmerWord},
    count::Count,
    error::KfcError,
};

/// Keys per arena segment.
const SEGMENT_LEN: usize = 1 << 20;

type Segment<K> = Box<[<K as KmerWord>::Atomic]>;

/// Raw key list with a fixed capacity.
///
/// Writers claim a disjoint range of slots by bumping an atomic cursor and
/// then store their keys without taking a lock. The slots live in an arena
/// of fixed-size segments that are allocated on first use, so the capacity
/// can be generous without committing memory up front.
///
/// Counting is deferred to [`finish`](Self::finish), which sorts the keys
/// and run-length encodes them. Invalid keys sort after every valid key and
/// are folded into the invalid count there.
#[derive(Debug)]
pub struct ListStore<K: KmerWord> {
    max_key: K,
    capacity: usize,
    cursor: AtomicUsize,
    segments: Box<[OnceLock<Segment<K>>]>,
}

impl<K: KmerWord> ListStore<K> {
    /// Creates a list for `key_bits`-bit keys with room for `capacity` keys.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::InvalidParameter`] for a bad `key_bits`, or
    /// [`KfcError::CapacityExceeded`] if `capacity` cannot be addressed.
    pub fn new(key_bits: u32, capacity: u64) -> Result<Self, KfcError> {
        let max_key = max_key_for(key_bits)?;
        let capacity = usize::try_from(capacity).map_err(|_| {
            KfcError::capacity_exceeded(format!(
                "list tally of {capacity} k-mers cannot be addressed on this platform"
            ))
        })?;

        let segments = (0..capacity.div_ceil(SEGMENT_LEN))
            .map(|_| OnceLock::new())
            .collect();

        Ok(Self {
            max_key,
            capacity,
            cursor: AtomicUsize::new(0),
            segments,
        })
    }

    pub const fn max_key(&self) -> K {
        self.max_key
    }

    /// Maximum number of keys the list can hold.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots claimed so far.
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tally(&self, key: K) -> Result<(), KfcError> {
        self.tally_batch(std::slice::from_ref(&key))
    }

    /// Appends `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::CapacityExhausted`] if the keys do not fit in the
    /// remaining capacity. None of `keys` is stored in that case.
    pub fn tally_batch(&self, keys: &[K]) -> Result<(), KfcError> {
        if keys.is_empty() {
            return Ok(());
        }

        // The cursor only advances when the whole batch fits, so it never
        // passes the capacity.
        let start = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |start| {
                start
                    .checked_add(keys.len())
                    .filter(|&end| end <= self.capacity)
            })
            .map_err(|_| self.exhausted())?;

        let mut position = start;
        let mut rest = keys;
        while !rest.is_empty() {
            let segment = self.segment(position / SEGMENT_LEN)?;
            let cells = segment.get(position % SEGMENT_LEN..).unwrap_or_default();
            if cells.is_empty() {
                return Err(self.exhausted());
            }

            let (now, later) = rest.split_at(cells.len().min(rest.len()));
            for (cell, &key) in cells.iter().zip(now) {
                cell.store(key);
            }
            position += now.len();
            rest = later;
        }

        Ok(())
    }

    fn exhausted(&self) -> KfcError {
        KfcError::CapacityExhausted {
            capacity: self.capacity as u64,
        }
    }

    /// Returns segment `index`, allocating it on first use.
    fn segment(&self, index: usize) -> Result<&[K::Atomic], KfcError> {
        let slot = self.segments.get(index).ok_or_else(|| self.exhausted())?;
        if let Some(segment) = slot.get() {
            return Ok(segment);
        }

        let len = SEGMENT_LEN.min(self.capacity - index * SEGMENT_LEN);
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|source| KfcError::OutOfMemory {
                source,
                strategy: Strategy::List,
                bytes: len as u64 * K::bytes(),
            })?;
        cells.extend((0..len).map(|_| <K::Atomic as AtomicWord<K>>::new(K::ZERO)));

        // A racing writer may have installed its own segment first; ours is
        // then dropped.
        Ok(slot.get_or_init(|| cells.into_boxed_slice()))
    }

    /// Claimed keys, in slot order.
    fn claimed(&self) -> impl Iterator<Item = K> + '_ {
        self.segments
            .iter()
            .filter_map(OnceLock::get)
            .flat_map(|segment| segment.iter().map(|cell| cell.load()))
            .take(self.len())
    }

    /// Number of invalid keys claimed so far. Scans the whole list.
    pub fn invalid_len(&self) -> usize {
        self.claimed().filter(|&key| key > self.max_key).count()
    }

    /// Sorts the claimed keys and counts runs of equal keys.
    ///
    /// Each segment is turned into a plain key vector in place and sorted on
    /// its own. The sorted segments are then merged straight into counts, and
    /// each is freed once drained. Peak memory stays at the size of the list
    /// plus the results.
    pub fn finish<C: Count>(self) -> TallyResults<K, C> {
        let len = self.len();
        let max_key = self.max_key;

        let mut invalid = 0usize;
        let mut sorted = Vec::new();
        for (index, slot) in self.segments.into_vec().into_iter().enumerate() {
            let Some(segment) = slot.into_inner() else {
                continue;
            };
            let claimed = len.saturating_sub(index * SEGMENT_LEN).min(segment.len());

            let mut keys: Vec<K> = segment
                .into_vec()
                .into_iter()
                .map(<K::Atomic as AtomicWord<K>>::into_inner)
                .collect();
            keys.truncate(claimed);
            keys.par_sort_unstable();

            let valid = keys.partition_point(|&key| key <= max_key);
            invalid += keys.len() - valid;
            keys.truncate(valid);
            if !keys.is_empty() {
                sorted.push(keys);
            }
        }

        let runs = merge_runs(sorted);
        TallyResults::from_sorted(max_key, runs, C::from_usize_saturating(invalid))
    }
}

/// K-way merge of sorted key lists into `(key, run length)` pairs.
fn merge_runs<K: KmerWord, C: Count>(mut lists: Vec<Vec<K>>) -> Vec<(K, C)> {
    let mut positions = vec![0usize; lists.len()];
    let mut heap: BinaryHeap<Reverse<(K, usize)>> = lists
        .iter()
        .enumerate()
        .filter_map(|(list, keys)| keys.first().map(|&key| Reverse((key, list))))
        .collect();

    let mut runs: Vec<(K, C)> = Vec::new();
    while let Some(Reverse((key, list))) = heap.pop() {
        let keys = &lists[list];
        let start = positions[list];
        let end = start + keys[start..].partition_point(|&other| other == key);
        let next = keys.get(end).copied();

        let run = C::from_usize_saturating(end - start);
        match runs.last_mut() {
            Some((last, count)) if *last == key => *count = count.saturating_add(run),
            _ => runs.push((key, run)),
        }

        positions[list] = end;
        match next {
            Some(next) => heap.push(Reverse((next, list))),
            None => lists[list] = Vec::new(),
        }
    }
    runs
}
