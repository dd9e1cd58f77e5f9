//! Builder API for counting k-mers from code.
//!
//! # Example
//!
//! ```rust
//! use kfcount::builder::CounterBuilder;
//!
//! let counts = CounterBuilder::new()
//!     .k(3)?
//!     .count_sequences([b"acgtca".as_slice()])?;
//!
//! assert_eq!(counts.kmers()[0], ("acg".to_string(), 2));
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

use std::path::Path;

use crate::{
    counter::{Counter, Counts},
    error::KfcError,
    format::SequenceFormat,
    input::Input,
    planner::{plan, plan_with_memory, Plan, PlannerConfig, MAX_KSIZE},
    progress::Progress,
    run::{count, count_with_progress},
    tally::Strategy,
};

/// Configures and runs a count.
///
/// Unset limits are left to the planner: the memory budget comes from the
/// machine and the strategy from the footprint estimates.
#[derive(Debug, Clone, Default)]
pub struct CounterBuilder {
    config: PlannerConfig,
    format: SequenceFormat,
}

impl CounterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the k-mer size.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::InvalidParameter`] if `k` is zero or larger than
    /// any key width supports. Parity is checked when planning, since it
    /// depends on the strand mode.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kfcount::builder::CounterBuilder;
    ///
    /// assert!(CounterBuilder::new().k(21).is_ok());
    /// assert!(CounterBuilder::new().k(32).is_err());
    /// ```
    pub fn k(mut self, k: usize) -> Result<Self, KfcError> {
        if k == 0 || k > MAX_KSIZE {
            return Err(KfcError::invalid_parameter(format!(
                "invalid k-mer size {k}: must be between 1 and {MAX_KSIZE}"
            )));
        }
        self.config.ksize = k;
        Ok(self)
    }

    /// Counts a k-mer and its reverse complement separately.
    #[must_use]
    pub fn single_strand(mut self, single_strand: bool) -> Self {
        self.config.single_strand = single_strand;
        self
    }

    /// Sets the expected input size in millions of bases.
    #[must_use]
    pub fn max_mbp(mut self, mbp: u64) -> Self {
        self.config.max_mbp = Some(mbp);
        self
    }

    /// Sets the memory budget in gigabytes.
    #[must_use]
    pub fn max_gb(mut self, gb: u64) -> Self {
        self.config.max_gb = Some(gb);
        self
    }

    /// Uses `strategy` regardless of the footprint estimates.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.force = Some(strategy);
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    /// Sets the bytes a map entry is assumed to cost beyond its key and
    /// count.
    #[must_use]
    pub fn map_entry_overhead(mut self, bytes: u64) -> Self {
        self.config.map_entry_overhead = bytes;
        self
    }

    #[must_use]
    pub fn input_format(mut self, format: SequenceFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans the count for this machine.
    ///
    /// # Errors
    ///
    /// See [`plan_with_memory`].
    pub fn plan(&self) -> Result<Plan, KfcError> {
        plan(&self.config)
    }

    /// Plans the count for a machine with `physical_bytes` of memory.
    pub fn plan_with_memory(&self, physical_bytes: u64) -> Result<Plan, KfcError> {
        plan_with_memory(&self.config, physical_bytes)
    }

    /// Plans and allocates a counter to feed directly.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kfcount::builder::CounterBuilder;
    ///
    /// let counter = CounterBuilder::new().k(5)?.single_strand(true).build()?;
    /// counter.process(b"acgtacgt")?;
    /// assert_eq!(counter.finish()?.total(), 4);
    /// # Ok::<(), kfcount::error::KfcError>(())
    /// ```
    pub fn build(&self) -> Result<Counter, KfcError> {
        self.plan()?.build()
    }

    /// Counts the k-mers of the files at `paths`; `-` reads standard input.
    ///
    /// # Errors
    ///
    /// Returns planning errors, and read or tally errors from the run.
    pub fn count<I, P>(&self, paths: I) -> Result<Counts, KfcError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        count(&Input::from_paths(paths), self.format, &self.plan()?)
    }

    /// Like [`count`](Self::count), invoking `callback` after each sequence.
    pub fn count_with_progress<I, P, F>(&self, paths: I, callback: F) -> Result<Counts, KfcError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        F: Fn(Progress) + Sync,
    {
        count_with_progress(&Input::from_paths(paths), self.format, &self.plan()?, callback)
    }

    /// Counts the k-mers of in-memory sequences on the calling thread.
    pub fn count_sequences<I, S>(&self, sequences: I) -> Result<Counts, KfcError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let counter = self.build()?;
        sequences
            .into_iter()
            .try_for_each(|seq| counter.process(seq.as_ref()))?;
        counter.finish()
    }
}
