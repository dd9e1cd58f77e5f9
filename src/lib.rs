//! # kfcount
//!
//! A k-mer frequency counter for DNA sequences.
//!
//! Every k-mer is packed into an integer key, two bits per base. Canonical
//! keys store the middle base in a single bit, picking whichever strand has
//! `a` or `c` in the middle, so a k-mer and its reverse complement share a
//! key. Windows containing a non-ACGT byte encode to an invalid marker and
//! are counted separately.
//!
//! Counts accumulate in one of three tallies, picked by a capacity planner
//! from the k-mer size and the memory and input size limits:
//!
//! - **vector**: one counter per possible key
//! - **map**: an ordered map of observed keys
//! - **list**: every key appended, then sorted and counted at the end
//!
//! ## Library usage
//!
//! ```rust
//! use kfcount::builder::CounterBuilder;
//!
//! let counts = CounterBuilder::new()
//!     .k(3)?
//!     .count_sequences([b"acgtca".as_slice()])?;
//!
//! for (kmer, count) in counts.kmers() {
//!     println!("{kmer}\t{count}");
//! }
//! # Ok::<(), kfcount::error::KfcError>(())
//! ```
//!
//! Lower-level pieces are public too: [`codec::KmerCodec`] encodes and
//! decodes keys, [`tally::Store`] tallies them, and [`planner`] chooses
//! between the strategies.
//!
//! ## Features
//!
//! - `gzip` (default): transparent decompression of gzip input

pub mod base;
pub mod bits;
pub mod builder;
pub mod cli;
pub mod codec;
pub mod count;
pub mod counter;
pub mod error;
pub mod format;
pub mod input;
pub mod planner;
pub mod progress;
pub mod reader;
pub mod report;
pub mod run;
pub mod tally;
