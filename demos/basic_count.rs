//! Basic k-mer counting.
//!
//! Counts the k-mers of one file with the builder API and prints a summary
//! followed by the most frequent k-mers.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic_count -- reads.fa [k] [expected-mbp]
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::env;
use std::process;

use kfcount::builder::CounterBuilder;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <sequence_file> [k] [expected_mbp]", args[0]);
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  sequence_file  FASTA, FASTQ or plain text, optionally gzipped");
        eprintln!("  k              K-mer length (default: 21)");
        eprintln!("  expected_mbp   Expected input size in Mbp (default: 100)");
        process::exit(1);
    }

    let path = &args[1];
    let k: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(21);
    let mbp: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);

    let builder = match CounterBuilder::new().k(k) {
        Ok(builder) => builder.max_mbp(mbp),
        Err(e) => {
            eprintln!("Invalid k-mer length: {e}");
            process::exit(1);
        }
    };

    let counts = match builder.count([path]) {
        Ok(counts) => counts,
        Err(e) => {
            eprintln!("Error counting k-mers: {e}");
            process::exit(1);
        }
    };

    println!("K-mer counting complete!");
    println!("  K-mer length:   {k}");
    println!("  Distinct:       {}", counts.distinct());
    println!("  Total:          {}", counts.total());
    println!("  Invalid:        {}", counts.invalid_count());

    let mut sorted = counts.kmers();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    println!("\nTop 10 most frequent k-mers:");
    for (kmer, count) in sorted.into_iter().take(10) {
        println!("  {kmer}: {count}");
    }
}
