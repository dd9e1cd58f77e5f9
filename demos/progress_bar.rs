//! K-mer counting with progress reporting.
//!
//! Uses the progress callback to keep a status line on stderr while a large
//! input is counted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example progress_bar -- genome.fa.gz [k]
//! ```

use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use kfcount::builder::CounterBuilder;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <sequence_file> [k]", args[0]);
        eprintln!();
        eprintln!("Shows progress while counting k-mers.");
        process::exit(1);
    }

    let path = &args[1];
    let k: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(21);

    eprintln!("Counting {k}-mers in {path}...\n");

    let builder = match CounterBuilder::new().k(k) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Sequences seen at the last status update, and the highest base total.
    let last_reported = AtomicU64::new(0);
    let bases = AtomicU64::new(0);
    let start = Instant::now();

    let result = builder.count_with_progress([path], |progress| {
        bases.fetch_max(progress.bases_processed, Ordering::Relaxed);

        let previous = last_reported.load(Ordering::Relaxed);
        if progress.sequences_processed >= previous + 100 {
            last_reported.store(progress.sequences_processed, Ordering::Relaxed);
            eprint!(
                "\r  Sequences: {:>10}  |  Bases: {:>10}",
                progress.sequences_processed,
                format_bases(progress.bases_processed)
            );
            let _ = io::stderr().flush();
        }
    });

    let counts = match result {
        Ok(counts) => counts,
        Err(e) => {
            eprintln!("\nError: {e}");
            process::exit(1);
        }
    };

    let elapsed = start.elapsed();
    let total_bases = bases.load(Ordering::Relaxed);

    eprintln!("\r{:60}", "");
    eprintln!("=== Results ===");
    eprintln!("Distinct k-mers:  {}", counts.distinct());
    eprintln!("Bases read:       {}", format_bases(total_bases));
    eprintln!("Processing time:  {elapsed:.2?}");

    if elapsed.as_secs_f64() > 0.0 && total_bases > 0 {
        let per_second = total_bases as f64 / elapsed.as_secs_f64();
        eprintln!("Throughput:       {} bases/sec", format_bases(per_second as u64));
    }

    let mut sorted = counts.kmers();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    eprintln!("\nTop 10 k-mers:");
    for (kmer, count) in sorted.into_iter().take(10) {
        eprintln!("  {kmer}: {count}");
    }
}

/// Formats a base count with an SI prefix.
fn format_bases(bases: u64) -> String {
    if bases >= 1_000_000_000 {
        format!("{:.2}G", bases as f64 / 1_000_000_000.0)
    } else if bases >= 1_000_000 {
        format!("{:.2}M", bases as f64 / 1_000_000.0)
    } else if bases >= 1_000 {
        format!("{:.2}K", bases as f64 / 1_000.0)
    } else {
        format!("{bases}")
    }
}
