//! Tests for tracing instrumentation.
//!
//! These tests verify that planning and reporting emit events through
//! whatever subscriber the caller installs.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kfcount::{
    builder::CounterBuilder,
    planner::{plan_with_memory, PlannerConfig},
    report::ReportOptions,
};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

const GIB: u64 = 1 << 30;

/// A simple layer that counts events at or above a level.
struct EventCounter {
    level: Level,
    count: Arc<AtomicUsize>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if event.metadata().level() <= &self.level {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` under a subscriber and returns the number of events at or above
/// `level`.
fn count_events<F: FnOnce()>(level: Level, f: F) -> usize {
    let count = Arc::new(AtomicUsize::new(0));
    let layer = EventCounter {
        level,
        count: Arc::clone(&count),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    count.load(Ordering::SeqCst)
}

#[test]
fn planning_emits_debug_events() {
    let events = count_events(Level::DEBUG, || {
        let config = PlannerConfig {
            ksize: 11,
            max_mbp: Some(10),
            ..PlannerConfig::default()
        };
        plan_with_memory(&config, 8 * GIB).unwrap();
    });
    assert!(events > 0, "should emit tracing events");
}

#[test]
fn thrashing_plan_warns() {
    let events = count_events(Level::WARN, || {
        let config = PlannerConfig {
            ksize: 31,
            single_strand: true,
            max_mbp: Some(1000),
            ..PlannerConfig::default()
        };
        let plan = plan_with_memory(&config, GIB).unwrap();
        assert!(plan.expect_thrashing);
    });
    assert_eq!(events, 1);
}

#[test]
fn comfortable_plan_does_not_warn() {
    let events = count_events(Level::WARN, || {
        let config = PlannerConfig {
            ksize: 11,
            max_mbp: Some(10),
            ..PlannerConfig::default()
        };
        plan_with_memory(&config, 8 * GIB).unwrap();
    });
    assert_eq!(events, 0);
}

#[test]
fn hidden_invalids_warn_when_reporting() {
    let counts = CounterBuilder::new()
        .k(3)
        .unwrap()
        .count_sequences(["acgnacg"])
        .unwrap();
    assert_eq!(counts.invalid_count(), 3);

    let hidden = count_events(Level::WARN, || {
        counts
            .write(&mut Vec::new(), &ReportOptions::default())
            .unwrap();
    });
    assert_eq!(hidden, 1);

    let shown = count_events(Level::WARN, || {
        let options = ReportOptions {
            invalids: true,
            ..ReportOptions::default()
        };
        counts.write(&mut Vec::new(), &options).unwrap();
    });
    assert_eq!(shown, 0);
}
