//! Capacity planning.
//!
//! Given the k-mer size, strand mode and the optional limits a user can
//! supply, the planner estimates the memory each tally strategy would need
//! and picks one. The decision itself is a pure function,
//! [`plan_with_memory`], so every branch can be tested with literal inputs;
//! [`plan`] only adds the physical memory probe.
//!
//! # Example
//!
//! ```rust
//! use kfcount::planner::{plan_with_memory, PlannerConfig};
//! use kfcount::tally::Strategy;
//!
//! let config = PlannerConfig {
//!     ksize: 15,
//!     ..PlannerConfig::default()
//! };
//!
//! // 4 GiB machine: 2 GiB budget, and the 2 GiB vector just fits.
//! let plan = plan_with_memory(&config, 4 << 30)?;
//! assert_eq!(plan.strategy, Strategy::Vector);
//! assert_eq!(plan.vector_bytes, 2 << 30);
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```

use std::num::NonZeroUsize;

use serde::Serialize;
use sysinfo::System;
use tracing::{debug, info, warn};

use crate::{
    codec::KmerCodec,
    counter::{Counter, Width},
    error::KfcError,
    tally::Strategy,
};

/// Default k-mer size.
pub const DEFAULT_KSIZE: usize = 15;

/// Largest k-mer size any key width supports.
pub const MAX_KSIZE: usize = KmerCodec::<u64>::MAX_KSIZE as usize;

/// A vector tally at most this large is always chosen.
pub const SMALL_FOOTPRINT: u64 = 512 << 20;

/// Memory left to the rest of the system when no budget is given.
pub const RESERVED_MEMORY: u64 = 2 << 30;

/// Default map overhead per entry, on top of the key and the count.
pub const DEFAULT_MAP_ENTRY_OVERHEAD: u64 = 24;

/// Bytes in a gigabyte, as accepted by the memory option.
const GIGABYTE: u64 = 1 << 30;

/// Bases in a megabase.
const MEGABASE: u64 = 1_000_000;

/// Largest expected input, in megabases, whose counts fit in 64 bits.
const MAX_MBP: u64 = (1 << 61) / 125_000;

/// Largest expected input, in megabases, whose counts fit in 32 bits.
const MAX_MBP_NARROW: u64 = (1 << 29) / 125_000;

/// Inputs to the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub ksize: usize,
    pub single_strand: bool,
    /// Expected input size in millions of bases. Also the count cap.
    pub max_mbp: Option<u64>,
    /// Memory budget in gigabytes.
    pub max_gb: Option<u64>,
    /// Strategy to use regardless of the estimates.
    pub force: Option<Strategy>,
    /// Worker threads. Defaults to the available parallelism.
    pub threads: Option<usize>,
    /// Bytes a map entry costs beyond its key and count.
    pub map_entry_overhead: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            ksize: DEFAULT_KSIZE,
            single_strand: false,
            max_mbp: None,
            max_gb: None,
            force: None,
            threads: None,
            map_entry_overhead: DEFAULT_MAP_ENTRY_OVERHEAD,
        }
    }
}

/// The planner's decision and the estimates behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub ksize: usize,
    pub single_strand: bool,
    pub key_bits: u32,
    pub key_width: Width,
    pub count_width: Width,
    pub strategy: Strategy,
    /// Memory budget in bytes.
    pub budget_bytes: u64,
    /// Whether the budget was given rather than derived from physical memory.
    pub budget_given: bool,
    /// Expected number of k-mers, when the input size is known.
    pub max_count: Option<u64>,
    /// Number of keys the list strategy is sized for.
    pub list_capacity: u64,
    pub vector_bytes: u64,
    /// List footprint, when the input size is known.
    pub list_bytes: Option<u64>,
    /// Map footprint, when the input size is known.
    pub map_bytes: Option<u64>,
    /// K-mers a list fits in the budget, when the input size is unknown.
    pub list_fits: Option<u64>,
    /// K-mers a map fits in the budget, when the input size is unknown.
    pub map_fits: Option<u64>,
    /// Whether the chosen strategy exceeds the budget.
    pub expect_thrashing: bool,
    pub threads: usize,
    /// Messages emitted while deciding.
    pub notes: Vec<String>,
}

impl Plan {
    /// Constructs the counter this plan describes.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::OutOfMemory`] if the chosen store cannot be
    /// allocated.
    pub fn build(&self) -> Result<Counter, KfcError> {
        debug!(
            strategy = %self.strategy,
            key_width = %self.key_width,
            count_width = %self.count_width,
            "allocating tally"
        );
        Counter::new(
            self.ksize,
            self.single_strand,
            self.strategy,
            self.key_width,
            self.count_width,
            self.list_capacity,
        )
    }

    fn note(&mut self, message: String) {
        self.notes.push(message);
    }
}

/// Physical memory of this machine in bytes.
pub fn physical_memory() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory()
}

/// Plans a run, budgeting from this machine's physical memory when no
/// memory cap is given.
///
/// # Errors
///
/// See [`plan_with_memory`].
pub fn plan(config: &PlannerConfig) -> Result<Plan, KfcError> {
    let physical = if config.max_gb.is_some() {
        0
    } else {
        physical_memory()
    };
    plan_with_memory(config, physical)
}

/// Plans a run for a machine with `physical_bytes` of memory.
///
/// # Arguments
///
/// * `config` - K-mer size, strand mode and limits
/// * `physical_bytes` - Physical memory, used only when no memory cap is
///   given
///
/// # Errors
///
/// Returns [`KfcError::InvalidParameter`] for an unsupported k-mer size or
/// strand mode, or an expected input too large to count, and
/// [`KfcError::CapacityExceeded`] if the memory cap rules out the forced
/// strategy or every strategy.
pub fn plan_with_memory(config: &PlannerConfig, physical_bytes: u64) -> Result<Plan, KfcError> {
    let ksize = config.ksize;
    if ksize == 0 || ksize > MAX_KSIZE {
        return Err(KfcError::invalid_parameter(format!(
            "invalid k-mer size {ksize}: must be between 1 and {MAX_KSIZE}"
        )));
    }
    if !config.single_strand && ksize % 2 == 0 {
        return Err(KfcError::invalid_parameter(format!(
            "invalid k-mer size {ksize}: canonical k-mers must have odd size; use single strand mode for even sizes"
        )));
    }

    let key_bits = 2 * ksize as u32 - u32::from(!config.single_strand);
    let key_width = if ksize <= KmerCodec::<u32>::MAX_KSIZE as usize {
        Width::Bits32
    } else {
        Width::Bits64
    };

    let max_mbp = config.max_mbp.filter(|&mbp| mbp > 0);
    let count_width = match max_mbp {
        Some(mbp) if mbp > MAX_MBP => {
            return Err(KfcError::invalid_parameter(format!(
                "expected input of {mbp} Mbp is too large: at most {MAX_MBP} Mbp can be counted"
            )))
        }
        Some(mbp) if mbp > MAX_MBP_NARROW => Width::Bits64,
        _ => Width::Bits32,
    };
    let max_count = max_mbp.map(|mbp| mbp * MEGABASE);

    let max_gb = config.max_gb.filter(|&gb| gb > 0);
    let budget_bytes = match max_gb {
        Some(gb) => gb.saturating_mul(GIGABYTE),
        None if physical_bytes > RESERVED_MEMORY => physical_bytes - RESERVED_MEMORY,
        None => physical_bytes,
    };
    debug!(
        ksize,
        key_bits,
        %key_width,
        %count_width,
        budget_bytes,
        "planning tally"
    );

    let key_bytes = key_width.bytes();
    let count_bytes = count_width.bytes();
    let entry_bytes = key_bytes + count_bytes + config.map_entry_overhead;

    let vector_bytes = 1u64
        .checked_shl(key_bits)
        .map_or(u64::MAX, |keys| keys.saturating_mul(count_bytes));

    let list_bytes = max_count.map(|count| count.saturating_mul(key_bytes));
    let map_bytes = max_count.map(|count| count.saturating_mul(entry_bytes));
    let (list_fits, map_fits) = if max_count.is_some() {
        (None, None)
    } else {
        (
            Some(budget_bytes / key_bytes),
            Some(budget_bytes / entry_bytes),
        )
    };
    let list_capacity = max_count.or(list_fits).unwrap_or(0);

    let mut plan = Plan {
        ksize,
        single_strand: config.single_strand,
        key_bits,
        key_width,
        count_width,
        strategy: Strategy::Vector,
        budget_bytes,
        budget_given: max_gb.is_some(),
        max_count,
        list_capacity,
        vector_bytes,
        list_bytes,
        map_bytes,
        list_fits,
        map_fits,
        expect_thrashing: false,
        threads: config
            .threads
            .filter(|&threads| threads > 0)
            .unwrap_or_else(default_threads),
        notes: Vec::new(),
    };

    debug!(vector_bytes, ?list_bytes, ?map_bytes, ?list_fits, ?map_fits, "tally footprints");

    if let (Some(gb), Some(mbp), Some(list), Some(map)) = (max_gb, max_mbp, list_bytes, map_bytes) {
        if vector_bytes > budget_bytes && list > budget_bytes && map > budget_bytes {
            return Err(KfcError::capacity_exceeded(format!(
                "no tally fits {mbp} Mbp in {gb} GB: vector needs {vector_bytes} bytes, list {list} bytes, map {map} bytes"
            )));
        }
    }

    if let Some(strategy) = config.force {
        check_forced(&plan, strategy, max_gb, max_mbp)?;
        plan.strategy = strategy;
        plan.note(format!("using the requested {strategy} tally"));
        debug!(%strategy, "tally strategy forced");
        return Ok(plan);
    }

    choose(&mut plan);
    Ok(plan)
}

fn check_forced(
    plan: &Plan,
    strategy: Strategy,
    max_gb: Option<u64>,
    max_mbp: Option<u64>,
) -> Result<(), KfcError> {
    let Some(gb) = max_gb else {
        return Ok(());
    };

    let needed = match strategy {
        Strategy::Vector => Some(plan.vector_bytes),
        Strategy::List => max_mbp.and(plan.list_bytes),
        Strategy::Map => max_mbp.and(plan.map_bytes),
    };

    match needed {
        Some(bytes) if bytes > plan.budget_bytes => {
            let input = max_mbp.map_or_else(String::new, |mbp| format!(" for {mbp} Mbp"));
            Err(KfcError::capacity_exceeded(format!(
                "requested {strategy} tally needs {bytes} bytes{input}, more than the {gb} GB limit"
            )))
        }
        _ => Ok(()),
    }
}

fn choose(plan: &mut Plan) {
    let budget = plan.budget_bytes;
    let vector = plan.vector_bytes;

    if vector <= SMALL_FOOTPRINT {
        plan.strategy = Strategy::Vector;
        debug!(vector_bytes = vector, "vector tally is small");
        return;
    }

    let (strategy, bytes) = match plan.list_bytes {
        Some(list) if list < SMALL_FOOTPRINT => (Strategy::List, list),
        Some(list) if vector < list => (Strategy::Vector, vector),
        Some(list) => (Strategy::List, list),
        None => {
            let message =
                "unknown input size; give the expected size in Mbp to plan memory use".to_string();
            info!("{message}");
            plan.note(message);
            if vector <= budget {
                (Strategy::Vector, vector)
            } else {
                (Strategy::List, budget)
            }
        }
    };

    plan.strategy = strategy;
    if bytes > budget {
        let message = format!(
            "{strategy} tally needs {bytes} bytes but only {budget} are available: expect thrashing"
        );
        warn!("{message}");
        plan.note(message);
        plan.expect_thrashing = true;
    }
    debug!(%strategy, bytes, "tally strategy chosen");
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const GIB: u64 = 1 << 30;

    fn config(ksize: usize, single_strand: bool, max_mbp: u64) -> PlannerConfig {
        PlannerConfig {
            ksize,
            single_strand,
            max_mbp: Some(max_mbp),
            threads: Some(1),
            ..PlannerConfig::default()
        }
    }

    fn plan_of(config: &PlannerConfig) -> Plan {
        plan_with_memory(config, 16 * GIB).unwrap()
    }

    #[test]
    fn small_vector_with_narrow_counts() {
        let plan = plan_of(&config(7, false, 1));
        assert_eq!(plan.strategy, Strategy::Vector);
        assert_eq!(plan.key_width, Width::Bits32);
        assert_eq!(plan.count_width, Width::Bits32);
        assert_eq!(plan.key_bits, 13);
        assert_eq!(plan.vector_bytes, 4 << 13);
    }

    #[test]
    fn large_input_widens_counts() {
        let plan = plan_of(&config(7, false, 8192));
        assert_eq!(plan.strategy, Strategy::Vector);
        assert_eq!(plan.key_width, Width::Bits32);
        assert_eq!(plan.count_width, Width::Bits64);
    }

    #[test]
    fn narrow_count_limit_is_inclusive() {
        assert_eq!(plan_of(&config(7, false, 4294)).count_width, Width::Bits32);
        assert_eq!(plan_of(&config(7, false, 4295)).count_width, Width::Bits64);
    }

    #[test]
    fn small_list_beats_large_vector() {
        let plan = plan_of(&config(15, true, 2));
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.key_width, Width::Bits32);
        assert_eq!(plan.list_bytes, Some(8_000_000));
        assert_eq!(plan.list_capacity, 2_000_000);
    }

    #[test]
    fn wide_keys_list() {
        let plan = plan_of(&config(24, true, 2));
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.key_width, Width::Bits64);
        assert_eq!(plan.list_bytes, Some(16_000_000));

        let plan = plan_of(&config(17, false, 8192));
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.key_width, Width::Bits64);
        assert_eq!(plan.count_width, Width::Bits64);
    }

    #[test]
    fn vector_wins_when_list_is_larger() {
        // 2^29 * 4 = 2 GiB vector against a 4 GB list.
        let plan = plan_of(&config(15, false, 1000));
        assert_eq!(plan.strategy, Strategy::Vector);
        assert!(!plan.expect_thrashing);
    }

    #[test]
    fn list_wins_within_budget() {
        // 8 GB list against a vector of 2^62 counters, with 14 GiB to spend.
        let plan = plan_of(&config(31, true, 1000));
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.key_width, Width::Bits64);
        assert_eq!(plan.list_bytes, Some(8_000_000_000));
        assert_eq!(plan.budget_bytes, 14 * GIB);
        assert!(!plan.expect_thrashing);
        assert!(plan.notes.is_empty());
    }

    #[test]
    #[traced_test]
    fn vector_wins_but_thrashes() {
        // 4 GiB vector against an 8 GB list, with 2 GiB to spend.
        let plan = plan_with_memory(&config(15, true, 2000), 4 * GIB).unwrap();
        assert_eq!(plan.strategy, Strategy::Vector);
        assert_eq!(plan.vector_bytes, 4 * GIB);
        assert_eq!(plan.list_bytes, Some(8_000_000_000));
        assert_eq!(plan.budget_bytes, 2 * GIB);
        assert!(plan.expect_thrashing);
        assert_eq!(plan.notes.len(), 1);
        assert!(plan.notes[0].starts_with("vector tally"));
        assert!(logs_contain("expect thrashing"));
    }

    #[test]
    fn thrashing_is_a_warning() {
        let plan = plan_with_memory(&config(31, true, 1000), GIB).unwrap();
        assert_eq!(plan.strategy, Strategy::List);
        assert!(plan.expect_thrashing);
        assert_eq!(plan.notes.len(), 1);
    }

    #[test]
    fn nothing_fits() {
        let mut config = config(15, true, 1024);
        config.max_gb = Some(1);
        let err = plan_with_memory(&config, 0).unwrap_err();
        assert!(matches!(err, KfcError::CapacityExceeded { .. }));
    }

    #[test]
    fn forced_vector_must_fit_budget() {
        let mut config = config(30, true, 2);
        config.max_gb = Some(1);
        config.force = Some(Strategy::Vector);
        let err = plan_with_memory(&config, 0).unwrap_err();
        assert!(matches!(err, KfcError::CapacityExceeded { .. }));
        assert!(err.to_string().contains("vector"));
    }

    #[test]
    fn forced_strategies() {
        for strategy in [Strategy::Vector, Strategy::Map, Strategy::List] {
            let mut config = config(15, true, 2);
            config.force = Some(strategy);
            assert_eq!(plan_of(&config).strategy, strategy);
        }

        let mut config = config(17, false, 2);
        config.force = Some(Strategy::List);
        let plan = plan_of(&config);
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.key_width, Width::Bits64);
    }

    #[test]
    fn forced_map_within_budget() {
        let mut config = config(21, false, 10);
        config.max_gb = Some(1);
        config.force = Some(Strategy::Map);
        let plan = plan_with_memory(&config, 0).unwrap();
        assert_eq!(plan.map_bytes, Some(10_000_000 * 36));
    }

    #[test]
    fn forced_without_input_size_fills_budget() {
        let mut config = PlannerConfig {
            ksize: 15,
            max_gb: Some(1),
            force: Some(Strategy::List),
            threads: Some(1),
            ..PlannerConfig::default()
        };
        let plan = plan_with_memory(&config, 0).unwrap();
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.list_bytes, None);
        assert_eq!(plan.list_capacity, GIB / 4);

        config.force = Some(Strategy::Map);
        assert_eq!(plan_with_memory(&config, 0).unwrap().strategy, Strategy::Map);

        config.ksize = 17;
        config.force = Some(Strategy::Vector);
        assert!(plan_with_memory(&config, 0).is_err());
    }

    #[test]
    fn forced_list_over_budget() {
        let mut config = config(7, true, 300);
        config.max_gb = Some(1);
        config.force = Some(Strategy::List);
        let err = plan_with_memory(&config, 0).unwrap_err();
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn unsupported_sizes() {
        for (ksize, single_strand) in [(0, true), (32, true), (16, false), (2, false)] {
            let config = PlannerConfig {
                ksize,
                single_strand,
                ..PlannerConfig::default()
            };
            let err = plan_with_memory(&config, 16 * GIB).unwrap_err();
            assert!(matches!(err, KfcError::InvalidParameter { .. }), "{ksize}");
        }
    }

    #[test]
    fn expected_input_too_large() {
        let err = plan_with_memory(&config(7, false, MAX_MBP + 1), 16 * GIB).unwrap_err();
        assert!(matches!(err, KfcError::InvalidParameter { .. }));
    }

    #[test]
    fn budget_from_physical_memory() {
        let config = PlannerConfig {
            ksize: 15,
            ..PlannerConfig::default()
        };
        let plan = plan_with_memory(&config, 4 * GIB).unwrap();
        assert_eq!(plan.budget_bytes, 2 * GIB);
        assert!(!plan.budget_given);
        assert_eq!(plan.strategy, Strategy::Vector);
        assert_eq!(plan.list_fits, Some(GIB / 2));
        assert_eq!(plan.map_fits, Some(2 * GIB / 32));

        let plan = plan_with_memory(&config, GIB).unwrap();
        assert_eq!(plan.budget_bytes, GIB);
        assert_eq!(plan.strategy, Strategy::List);
        assert_eq!(plan.list_capacity, GIB / 4);
        assert!(!plan.expect_thrashing);
    }

    #[test]
    fn unknown_size_is_noted() {
        let config = PlannerConfig {
            ksize: 15,
            ..PlannerConfig::default()
        };
        let plan = plan_with_memory(&config, 8 * GIB).unwrap();
        assert!(plan.notes.iter().any(|note| note.contains("unknown input size")));
    }

    #[test]
    fn decisions_are_repeatable() {
        let config = config(19, true, 300);
        assert_eq!(plan_of(&config), plan_of(&config));
    }

    #[test]
    fn builds_planned_counter() {
        let counter = plan_of(&config(15, true, 2)).build().unwrap();
        assert_eq!(counter.strategy(), Strategy::List);
        assert_eq!(counter.key_width(), Width::Bits32);
        assert_eq!(counter.ksize(), 15);
    }

    #[test]
    #[traced_test]
    fn planning_decisions_are_logged() {
        plan_with_memory(&config(31, true, 1000), GIB).unwrap();
        assert!(logs_contain("expect thrashing"));

        let config = PlannerConfig {
            ksize: 15,
            ..PlannerConfig::default()
        };
        plan_with_memory(&config, 8 * GIB).unwrap();
        assert!(logs_contain("unknown input size"));
    }
}
