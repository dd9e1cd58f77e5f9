//! Tests for gzip compressed input support.

#![cfg(feature = "gzip")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::process::Command;

use flate2::{write::GzEncoder, Compression};
use kfcount::builder::CounterBuilder;
use tempfile::NamedTempFile;

const FASTA: &str = ">seq1\nACGTACGT\n>seq2\nGATTACA\n";

fn write_file(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn gzip_and_plain_produce_same_results() {
    let plain = write_file(".fa", FASTA.as_bytes());
    let compressed = write_file(".fa.gz", &gzip(FASTA.as_bytes()));

    let builder = CounterBuilder::new().k(3).unwrap();
    let plain_counts = builder.count([plain.path()]).expect("should count plain file");
    let gzip_counts = builder
        .count([compressed.path()])
        .expect("should count gzipped file");

    assert!(!gzip_counts.kmers().is_empty());
    assert_eq!(plain_counts.kmers(), gzip_counts.kmers());
}

#[test]
fn gzip_is_detected_without_extension() {
    let compressed = write_file(".dat", &gzip(b"@r\nacgtca\n+\nIIIIII\n"));
    let counts = CounterBuilder::new()
        .k(3)
        .unwrap()
        .count([compressed.path()])
        .unwrap();
    assert_eq!(counts.total(), 4);
    assert_eq!(counts.distinct(), 3);
}

#[test]
fn concatenated_gzip_members_are_read() {
    let mut content = gzip(b">a\nacg\n");
    content.extend(gzip(b">b\nacg\n"));
    let compressed = write_file(".fa.gz", &content);
    let counts = CounterBuilder::new()
        .k(3)
        .unwrap()
        .count([compressed.path()])
        .unwrap();
    assert_eq!(counts.kmers(), vec![("acg".to_string(), 2)]);
}

#[test]
fn cli_reads_gzip_file() {
    let compressed = write_file(".fa.gz", &gzip(b">seq\nacgtca\n"));
    let output = Command::new(env!("CARGO_BIN_EXE_kfc"))
        .args(["-k", "3", "-q"])
        .arg(compressed.path())
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "acg\t6\t2\ngac\t17\t1\ntca\t28\t1\n"
    );
}
