//! Count reports.
//!
//! The TSV report has two comment lines describing the run, then one row
//! per k-mer in ascending key order:
//!
//! ```text
//! # kfc 3-mer counts (canonical, destranded); omitting zero counts
//! #k-mer	c-code	count
//! acg	6	2
//! ```
//!
//! Single strand runs label the key column `s-code`. The DNA column, the
//! headers, zero-count rows and an `invalid` row totalling k-mers with
//! non-ACGT bases are all optional. The JSON report carries the same rows
//! as objects.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;
use tracing::warn;

use crate::{bits::KmerWord, count::Count, counter::KmerCounts, error::KfcError};

/// Output format for k-mer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated rows with comment headers.
    #[default]
    Tsv,
    /// JSON object with an array of rows.
    Json,
}

/// What a report includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Render each key as DNA.
    pub dna: bool,
    /// Write the comment headers.
    pub headers: bool,
    /// Include keys that were never observed.
    pub zeros: bool,
    /// Include a row with the invalid k-mer total.
    pub invalids: bool,
    pub format: OutputFormat,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            dna: true,
            headers: true,
            zeros: false,
            invalids: false,
            format: OutputFormat::Tsv,
        }
    }
}

/// Label of the invalid pseudo-row.
pub const INVALID_LABEL: &str = "invalid";

#[derive(Serialize)]
struct JsonReport {
    ksize: usize,
    single_strand: bool,
    invalid: u64,
    counts: Vec<JsonRow>,
}

#[derive(Serialize)]
struct JsonRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    kmer: Option<String>,
    key: u64,
    count: u64,
}

/// Writes `counts` to `out`.
///
/// Logs a warning with the total when invalid k-mers were counted but the
/// invalid row is not requested.
///
/// # Errors
///
/// Returns [`KfcError::WriteError`] or [`KfcError::JsonError`] if the
/// report cannot be written.
pub fn write_counts<K, C, W>(
    out: &mut W,
    counts: &KmerCounts<K, C>,
    options: &ReportOptions,
) -> Result<(), KfcError>
where
    K: KmerWord,
    C: Count,
    W: Write,
{
    let invalid = counts.results().invalid_count().widen();
    if invalid > 0 && !options.invalids {
        warn!(invalid, "{invalid} k-mers with non-ACGT bases were not counted");
    }

    match options.format {
        OutputFormat::Tsv => write_tsv(out, counts, options, invalid),
        OutputFormat::Json => write_json(out, counts, options, invalid),
    }
}

fn write_tsv<K, C, W>(
    out: &mut W,
    counts: &KmerCounts<K, C>,
    options: &ReportOptions,
    invalid: u64,
) -> Result<(), KfcError>
where
    K: KmerWord,
    C: Count,
    W: Write,
{
    let codec = counts.codec();
    let results = counts.results();

    if options.headers {
        write!(
            out,
            "# kfc {}-mer counts {}",
            codec.ksize(),
            if codec.single_strand() {
                "(single strand directional)"
            } else {
                "(canonical, destranded)"
            }
        )?;
        if !options.invalids && invalid > 0 {
            write!(out, "; excluding {invalid} invalid k-mers")?;
        }
        if !options.zeros {
            write!(out, "; omitting zero counts")?;
        }
        writeln!(out)?;

        write!(out, "#")?;
        if options.dna {
            write!(out, "k-mer\t")?;
        }
        let code = if codec.single_strand() { "s-code" } else { "c-code" };
        writeln!(out, "{code}\tcount")?;
    }

    let mut row = |key: K, count: C| -> Result<(), KfcError> {
        if options.dna {
            write!(out, "{}\t", codec.decode(key))?;
        }
        writeln!(out, "{key}\t{count}")?;
        Ok(())
    };

    if options.zeros {
        results
            .iter_with_zeros()
            .try_for_each(|(key, count)| row(key, count))?;
    } else {
        results.iter().try_for_each(|(key, count)| row(key, count))?;
    }

    if options.invalids && (invalid > 0 || options.zeros) {
        if options.dna {
            write!(out, "{INVALID_LABEL}\t")?;
        }
        writeln!(out, "{}\t{invalid}", codec.invalid_key())?;
    }

    Ok(())
}

fn write_json<K, C, W>(
    out: &mut W,
    counts: &KmerCounts<K, C>,
    options: &ReportOptions,
    invalid: u64,
) -> Result<(), KfcError>
where
    K: KmerWord,
    C: Count,
    W: Write,
{
    let codec = counts.codec();
    let to_row = |(key, count): (K, C)| JsonRow {
        kmer: options.dna.then(|| codec.decode(key)),
        key: key.to_u64(),
        count: count.widen(),
    };

    let mut rows: Vec<JsonRow> = if options.zeros {
        counts.results().iter_with_zeros().map(to_row).collect()
    } else {
        counts.results().iter().map(to_row).collect()
    };
    if options.invalids && (invalid > 0 || options.zeros) {
        rows.push(JsonRow {
            kmer: options.dna.then(|| INVALID_LABEL.to_string()),
            key: codec.invalid_key(),
            count: invalid,
        });
    }

    let report = JsonReport {
        ksize: codec.ksize(),
        single_strand: codec.single_strand(),
        invalid,
        counts: rows,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
