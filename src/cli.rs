//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

use crate::{
    format::SequenceFormat,
    input::Input,
    planner::{PlannerConfig, DEFAULT_KSIZE, MAX_KSIZE},
    report::{OutputFormat, ReportOptions},
    tally::Strategy,
};

/// Count k-mers in DNA sequences.
///
/// Reads FASTA, FASTQ or plain text (one sequence per line), optionally
/// gzip-compressed, and writes a count for every k-mer in ascending key
/// order.
#[derive(Parser, Debug)]
#[command(name = "kfc")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input files; '-' reads standard input
    #[arg(value_name = "FILE", default_value = "-")]
    pub files: Vec<PathBuf>,

    /// K-mer size; must be odd unless --single-strand is given
    #[arg(short, long = "ksize", default_value_t = DEFAULT_KSIZE, value_parser = parse_k)]
    pub k: usize,

    /// Count a k-mer and its reverse complement separately
    #[arg(short, long)]
    pub single_strand: bool,

    /// Omit the k-mer DNA column
    #[arg(short = 'n', long)]
    pub no_dna: bool,

    /// Include k-mers that were never observed
    #[arg(short, long)]
    pub zeros: bool,

    /// Include a row with the number of invalid k-mers
    #[arg(short, long)]
    pub invalids: bool,

    /// Omit the comment headers
    #[arg(short = 'q', long)]
    pub no_headers: bool,

    /// Memory budget in GB [default: physical memory less 2 GB]
    #[arg(short, long, value_name = "GB", value_parser = clap::value_parser!(u64).range(1..))]
    pub memory: Option<u64>,

    /// Expected input size in millions of bases
    #[arg(short = 'l', long, value_name = "MBP", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_mbp: Option<u64>,

    /// Worker threads [default: available parallelism]
    #[arg(short, long, value_name = "NUM", value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Tally implementation, overriding the planner
    #[arg(short = 'x', long = "implementation", value_enum)]
    pub implementation: Option<Strategy>,

    /// Log planning decisions and run statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tsv")]
    pub format: OutputFormat,

    /// Input format
    #[arg(long, value_enum, default_value = "auto")]
    pub input_format: SequenceFormat,

    /// Print the plan as JSON and exit without counting
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            ksize: self.k,
            single_strand: self.single_strand,
            max_mbp: self.max_mbp,
            max_gb: self.memory,
            force: self.implementation,
            threads: self.threads,
            ..PlannerConfig::default()
        }
    }

    pub const fn report_options(&self) -> ReportOptions {
        ReportOptions {
            dna: !self.no_dna,
            headers: !self.no_headers,
            zeros: self.zeros,
            invalids: self.invalids,
            format: self.format,
        }
    }

    pub fn inputs(&self) -> Vec<Input> {
        Input::from_paths(&self.files)
    }
}

fn parse_k(s: &str) -> Result<usize, String> {
    let k: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if k == 0 {
        return Err("k-mer size must be at least 1".to_string());
    }
    if k > MAX_KSIZE {
        return Err(format!("k-mer size must be at most {MAX_KSIZE}"));
    }
    Ok(k)
}

fn parse_threads(s: &str) -> Result<usize, String> {
    match s.parse() {
        Ok(0) => Err("at least one thread is needed".to_string()),
        Ok(threads) => Ok(threads),
        Err(_) => Err(format!("'{s}' is not a valid number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["kfc"]);
        assert_eq!(args.k, 15);
        assert_eq!(args.inputs(), vec![Input::Stdin]);
        assert_eq!(args.report_options(), ReportOptions::default());
        assert_eq!(args.planner_config(), PlannerConfig::default());
    }

    #[test]
    fn all_options() {
        let args = Args::parse_from([
            "kfc", "-k", "21", "-s", "-n", "-z", "-i", "-q", "-m", "4", "-l", "100", "-t", "2",
            "-x", "list", "-f", "json", "--input-format", "fastq", "a.fq", "-",
        ]);
        let config = args.planner_config();
        assert_eq!(config.ksize, 21);
        assert!(config.single_strand);
        assert_eq!(config.max_gb, Some(4));
        assert_eq!(config.max_mbp, Some(100));
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.force, Some(Strategy::List));

        let options = args.report_options();
        assert!(!options.dna && !options.headers && options.zeros && options.invalids);
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(args.input_format, SequenceFormat::Fastq);
        assert_eq!(args.inputs().len(), 2);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Args::try_parse_from(["kfc", "-k", "0"]).is_err());
        assert!(Args::try_parse_from(["kfc", "-k", "32"]).is_err());
        assert!(Args::try_parse_from(["kfc", "-t", "0"]).is_err());
        assert!(Args::try_parse_from(["kfc", "-m", "0"]).is_err());
        assert!(Args::try_parse_from(["kfc", "-x", "hash"]).is_err());
    }
}
