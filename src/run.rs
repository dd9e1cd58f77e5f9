//! Counting runs.
//!
//! A run builds the planned counter, then streams every input through a
//! rayon pool. `par_bridge` serialises only the act of pulling the next
//! record; encoding and tallying happen on the workers, each with its own
//! key buffer. The first error stops the run and no counts are returned.

use std::io::{stdout, BufWriter, Write};

use bytes::Bytes;
use rayon::{
    iter::{ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use tracing::{debug, info_span};

use crate::{
    cli::Args,
    counter::{Counter, Counts, KeyBuffer},
    error::KfcError,
    format::SequenceFormat,
    input::Input,
    planner::{self, Plan},
    progress::{Progress, ProgressTracker},
    reader::Sequences,
};

/// Counts the k-mers of every input with the planned counter.
///
/// # Errors
///
/// Returns the first error from allocation, reading or tallying.
pub fn count(inputs: &[Input], format: SequenceFormat, plan: &Plan) -> Result<Counts, KfcError> {
    count_with_progress(inputs, format, plan, |_| {})
}

/// Like [`count`], invoking `callback` after each sequence.
///
/// # Arguments
///
/// * `inputs` - Sources, read in order
/// * `format` - Input format, or `Auto` to detect per input
/// * `plan` - Planner decision to build the counter from
/// * `callback` - Called from worker threads with the progress so far
pub fn count_with_progress<F>(
    inputs: &[Input],
    format: SequenceFormat,
    plan: &Plan,
    callback: F,
) -> Result<Counts, KfcError>
where
    F: Fn(Progress) + Sync,
{
    let counter = plan.build()?;
    let pool = ThreadPoolBuilder::new().num_threads(plan.threads).build()?;
    let tracker = ProgressTracker::new();

    for input in inputs {
        let _span = info_span!("input", input = %input).entered();
        let sequences = Sequences::open(input, format)?;
        pool.install(|| feed(&counter, sequences, &tracker, &callback))?;
    }

    let progress = tracker.snapshot();
    debug!(
        sequences = progress.sequences_processed,
        bases = progress.bases_processed,
        invalid = counter.invalid_count(),
        "counting finished"
    );
    counter.finish()
}

/// Tallies `sequences` in parallel on the current rayon pool.
///
/// # Errors
///
/// Returns the first read or tally error; remaining sequences are not
/// processed.
pub fn feed<I, F>(
    counter: &Counter,
    sequences: I,
    tracker: &ProgressTracker,
    callback: &F,
) -> Result<(), KfcError>
where
    I: Iterator<Item = Result<Bytes, KfcError>> + Send,
    F: Fn(Progress) + Sync,
{
    sequences
        .par_bridge()
        .try_for_each_init(KeyBuffer::default, |buffer, sequence| {
            let sequence = sequence?;
            counter.process_with(&sequence, buffer)?;
            callback(tracker.record_sequence(sequence.len() as u64));
            Ok(())
        })
}

/// Runs the command line workflow: plan, count, report to stdout.
///
/// # Errors
///
/// Returns configuration errors before any input is read, and read, tally
/// or write errors after.
pub fn run(args: &Args) -> Result<(), KfcError> {
    let plan = planner::plan(&args.planner_config())?;
    debug!(?plan, "plan");

    let stdout = stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.dry_run {
        serde_json::to_writer_pretty(&mut out, &plan)?;
        writeln!(out)?;
        out.flush()?;
        return Ok(());
    }

    let counts = count(&args.inputs(), args.input_format, &plan)?;
    counts.write(&mut out, &args.report_options())?;
    out.flush()?;
    Ok(())
}
