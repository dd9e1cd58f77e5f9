//! Streaming sequence readers.
//!
//! [`Sequences`] yields the bases of each record as [`Bytes`], one record at
//! a time, so inputs of any size are read in constant memory. FASTA and
//! FASTQ are parsed with `bio`; plain text is one sequence per line.
//! Gzip-compressed input is detected by its magic bytes and decompressed
//! transparently when the `gzip` feature is enabled.

use std::{
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use bio::io::{fasta, fastq};
use bytes::Bytes;
use tracing::debug;

use crate::{error::KfcError, format::SequenceFormat, input::Input};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

type Source = Box<dyn BufRead + Send>;
type Records = Box<dyn Iterator<Item = Result<Bytes, KfcError>> + Send>;

/// Iterator over the sequences of one input.
pub struct Sequences {
    format: SequenceFormat,
    records: Records,
}

impl std::fmt::Debug for Sequences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequences")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Sequences {
    /// Opens `input` and detects its compression and format.
    ///
    /// # Errors
    ///
    /// Returns [`KfcError::SequenceRead`] if the file cannot be opened or
    /// its first bytes cannot be read, or [`KfcError::SequenceParse`] for
    /// gzip input when the `gzip` feature is disabled.
    pub fn open(input: &Input, format: SequenceFormat) -> Result<Self, KfcError> {
        Self::with_source(input.open()?, input.as_path(), format, input.display_path())
    }

    /// Reads sequences from any reader. `Auto` detection uses the content
    /// only.
    pub fn from_reader<R>(reader: R, format: SequenceFormat) -> Result<Self, KfcError>
    where
        R: Read + Send + 'static,
    {
        Self::with_source(reader, None, format, PathBuf::from("<reader>"))
    }

    fn with_source<R>(
        reader: R,
        hint: Option<&Path>,
        format: SequenceFormat,
        path: PathBuf,
    ) -> Result<Self, KfcError>
    where
        R: Read + Send + 'static,
    {
        let mut source = decompress(reader, &path)?;
        let leading = source
            .fill_buf()
            .map_err(|source| KfcError::SequenceRead {
                source,
                path: path.clone(),
            })?
            .first()
            .copied();

        let format = format.resolve(hint, leading);
        debug!(input = %path.display(), %format, "reading sequences");

        let records: Records = match format {
            SequenceFormat::Fastq => Box::new(fastq::Reader::new(source).records().map(
                move |record| {
                    record
                        .map(|record| Bytes::copy_from_slice(record.seq()))
                        .map_err(|err| KfcError::SequenceParse {
                            details: err.to_string(),
                            path: path.clone(),
                        })
                },
            )),
            SequenceFormat::Plain => Box::new(PlainLines {
                source,
                path,
                line: Vec::new(),
            }),
            SequenceFormat::Fasta | SequenceFormat::Auto => Box::new(
                fasta::Reader::new(source)
                    .records()
                    .map(move |record| {
                        record
                            .map(|record| Bytes::copy_from_slice(record.seq()))
                            .map_err(|source| read_error(source, &path))
                    }),
            ),
        };

        Ok(Self { format, records })
    }

    /// The resolved format.
    pub const fn format(&self) -> SequenceFormat {
        self.format
    }
}

impl Iterator for Sequences {
    type Item = Result<Bytes, KfcError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

fn read_error(source: io::Error, path: &Path) -> KfcError {
    if source.kind() == io::ErrorKind::InvalidData {
        KfcError::SequenceParse {
            details: source.to_string(),
            path: path.to_path_buf(),
        }
    } else {
        KfcError::SequenceRead {
            source,
            path: path.to_path_buf(),
        }
    }
}

/// Wraps `reader` in a gzip decoder if it starts with the gzip magic bytes.
fn decompress<R>(reader: R, path: &Path) -> Result<Source, KfcError>
where
    R: Read + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let head = reader.fill_buf().map_err(|source| KfcError::SequenceRead {
        source,
        path: path.to_path_buf(),
    })?;

    if !head.starts_with(&GZIP_MAGIC) {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "gzip")]
    {
        debug!(input = %path.display(), "decompressing gzip input");
        Ok(Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(
            reader,
        ))))
    }

    #[cfg(not(feature = "gzip"))]
    {
        Err(KfcError::SequenceParse {
            details: "gzip-compressed input needs the gzip feature".to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// One sequence per non-empty line.
struct PlainLines<R> {
    source: R,
    path: PathBuf,
    line: Vec<u8>,
}

impl<R: BufRead> Iterator for PlainLines<R> {
    type Item = Result<Bytes, KfcError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.source.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    let seq = trim_end(&self.line);
                    if !seq.is_empty() {
                        return Some(Ok(Bytes::copy_from_slice(seq)));
                    }
                }
                Err(source) => {
                    return Some(Err(KfcError::SequenceRead {
                        source,
                        path: self.path.clone(),
                    }))
                }
            }
        }
    }
}

fn trim_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |last| last + 1);
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(content: &'static [u8], format: SequenceFormat) -> Vec<Bytes> {
        Sequences::from_reader(Cursor::new(content), format)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn fasta_records() {
        let seqs = read(b">one\nACGT\nAC\n>two\nTTT\n", SequenceFormat::Auto);
        assert_eq!(seqs, vec![Bytes::from_static(b"ACGTAC"), Bytes::from_static(b"TTT")]);
    }

    #[test]
    fn fastq_records() {
        let seqs = read(b"@r1\nACGT\n+\nIIII\n@r2\nGG\n+\nII\n", SequenceFormat::Auto);
        assert_eq!(seqs, vec![Bytes::from_static(b"ACGT"), Bytes::from_static(b"GG")]);
    }

    #[test]
    fn plain_lines_skip_blanks() {
        let seqs = read(b"acgt\r\n\n  \ntt\n", SequenceFormat::Auto);
        assert_eq!(seqs, vec![Bytes::from_static(b"acgt"), Bytes::from_static(b"tt")]);
    }

    #[test]
    fn explicit_plain_keeps_header_lines() {
        let seqs = read(b">x\nac\n", SequenceFormat::Plain);
        assert_eq!(seqs.len(), 2);
    }

    #[test]
    fn empty_input() {
        let sequences =
            Sequences::from_reader(Cursor::new(Vec::new()), SequenceFormat::Auto).unwrap();
        assert_eq!(sequences.format(), SequenceFormat::Plain);
        assert_eq!(sequences.count(), 0);
    }

    #[test]
    fn truncated_fastq_is_an_error() {
        let truncated = Cursor::new(b"@r1\nACGT\nIIII\n".to_vec());
        let result: Result<Vec<_>, _> =
            Sequences::from_reader(truncated, SequenceFormat::Fastq)
                .unwrap()
                .collect();
        assert!(matches!(result, Err(KfcError::SequenceParse { .. })));
    }

    #[test]
    fn missing_file() {
        let input = Input::File(PathBuf::from("/nonexistent/reads.fa"));
        let err = Sequences::open(&input, SequenceFormat::Auto).unwrap_err();
        assert!(matches!(err, KfcError::SequenceRead { .. }));
        assert!(err.to_string().contains("/nonexistent/reads.fa"));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_detected_by_magic() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">r\nacgt\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let seqs: Vec<_> = Sequences::from_reader(Cursor::new(compressed), SequenceFormat::Auto)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(seqs, vec![Bytes::from_static(b"acgt")]);
    }

    #[test]
    fn trims_trailing_whitespace_only() {
        assert_eq!(trim_end(b" ac \t\r\n"), b" ac");
        assert_eq!(trim_end(b"\n"), b"");
    }
}
