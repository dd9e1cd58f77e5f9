//! Input format detection and selection.
//!
//! Sequences arrive as FASTA, FASTQ or plain text with one sequence per
//! line. The format is either given explicitly or detected from the file
//! extension, falling back to the first byte of the (decompressed) content.

use clap::ValueEnum;
use std::ffi::OsStr;
use std::path::Path;

/// Input sequence file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SequenceFormat {
    /// Detect from the extension, then from the content.
    ///
    /// Detection rules:
    /// - `.fq`, `.fastq` (optionally `.gz`) -> FASTQ
    /// - `.fa`, `.fasta`, `.fna`, `.fas` (optionally `.gz`) -> FASTA
    /// - `.txt`, `.seq` (optionally `.gz`) -> plain
    /// - otherwise: `>` first -> FASTA, `@` first -> FASTQ, else plain
    #[default]
    Auto,
    /// FASTA format.
    Fasta,
    /// FASTQ format.
    Fastq,
    /// One sequence per line.
    Plain,
}

impl SequenceFormat {
    /// Detects the sequence format from a file path's extension.
    ///
    /// Handles gzip-compressed files by stripping the `.gz` extension first.
    /// Returns `None` for extensions that say nothing about the format.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfcount::format::SequenceFormat;
    /// use std::path::Path;
    ///
    /// let detect = |name: &str| SequenceFormat::from_extension(Path::new(name));
    ///
    /// assert_eq!(detect("reads.fq"), Some(SequenceFormat::Fastq));
    /// assert_eq!(detect("genome.fasta.gz"), Some(SequenceFormat::Fasta));
    /// assert_eq!(detect("reads.gz"), None);
    /// ```
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase);

        let effective_ext = match ext.as_deref() {
            Some("gz") => path
                .file_stem()
                .and_then(|stem| Path::new(stem).extension())
                .and_then(OsStr::to_str)
                .map(str::to_lowercase),
            other => other.map(String::from),
        };

        match effective_ext.as_deref() {
            Some("fq" | "fastq") => Some(Self::Fastq),
            Some("fa" | "fasta" | "fna" | "fas") => Some(Self::Fasta),
            Some("txt" | "seq") => Some(Self::Plain),
            _ => None,
        }
    }

    /// Detects the sequence format from the first byte of the content.
    #[must_use]
    pub const fn from_leading_byte(byte: Option<u8>) -> Self {
        match byte {
            Some(b'>') => Self::Fasta,
            Some(b'@') => Self::Fastq,
            _ => Self::Plain,
        }
    }

    /// Resolves `Auto` to a concrete format.
    ///
    /// A recognised extension on `path` wins; otherwise `leading`, the first
    /// byte of the content, decides. Explicit formats are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfcount::format::SequenceFormat;
    /// use std::path::Path;
    ///
    /// let format = SequenceFormat::Auto.resolve(Some(Path::new("reads.fq")), Some(b'>'));
    /// assert_eq!(format, SequenceFormat::Fastq);
    ///
    /// let format = SequenceFormat::Auto.resolve(None, Some(b'>'));
    /// assert_eq!(format, SequenceFormat::Fasta);
    ///
    /// let format = SequenceFormat::Plain.resolve(Some(Path::new("reads.fq")), None);
    /// assert_eq!(format, SequenceFormat::Plain);
    /// ```
    #[must_use]
    pub fn resolve(self, path: Option<&Path>, leading: Option<u8>) -> Self {
        match self {
            Self::Auto => path
                .and_then(Self::from_extension)
                .unwrap_or_else(|| Self::from_leading_byte(leading)),
            other => other,
        }
    }
}

impl std::fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fasta => write!(f, "fasta"),
            Self::Fastq => write!(f, "fastq"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_extension_known() {
        for (name, format) in [
            ("test.fa", SequenceFormat::Fasta),
            ("test.FASTA", SequenceFormat::Fasta),
            ("test.fna", SequenceFormat::Fasta),
            ("test.fq", SequenceFormat::Fastq),
            ("test.fastq", SequenceFormat::Fastq),
            ("test.txt", SequenceFormat::Plain),
            ("test.seq", SequenceFormat::Plain),
        ] {
            assert_eq!(SequenceFormat::from_extension(Path::new(name)), Some(format), "{name}");
        }
    }

    #[test]
    fn from_extension_gzipped() {
        assert_eq!(
            SequenceFormat::from_extension(Path::new("test.fa.gz")),
            Some(SequenceFormat::Fasta)
        );
        assert_eq!(
            SequenceFormat::from_extension(Path::new("test.fastq.gz")),
            Some(SequenceFormat::Fastq)
        );
        assert_eq!(SequenceFormat::from_extension(Path::new("test.gz")), None);
    }

    #[test]
    fn from_extension_unknown() {
        assert_eq!(SequenceFormat::from_extension(Path::new("test.dat")), None);
        assert_eq!(SequenceFormat::from_extension(Path::new("test")), None);
    }

    #[test]
    fn from_leading_byte() {
        assert_eq!(SequenceFormat::from_leading_byte(Some(b'>')), SequenceFormat::Fasta);
        assert_eq!(SequenceFormat::from_leading_byte(Some(b'@')), SequenceFormat::Fastq);
        assert_eq!(SequenceFormat::from_leading_byte(Some(b'a')), SequenceFormat::Plain);
        assert_eq!(SequenceFormat::from_leading_byte(None), SequenceFormat::Plain);
    }

    #[test]
    fn resolve_falls_back_to_content() {
        assert_eq!(
            SequenceFormat::Auto.resolve(Some(Path::new("reads.dat")), Some(b'@')),
            SequenceFormat::Fastq
        );
        assert_eq!(SequenceFormat::Auto.resolve(None, Some(b'c')), SequenceFormat::Plain);
    }

    #[test]
    fn resolve_explicit_format_unchanged() {
        assert_eq!(
            SequenceFormat::Fasta.resolve(Some(Path::new("test.fq")), Some(b'@')),
            SequenceFormat::Fasta
        );
    }

    #[test]
    fn display() {
        assert_eq!(SequenceFormat::Auto.to_string(), "auto");
        assert_eq!(SequenceFormat::Plain.to_string(), "plain");
    }
}
