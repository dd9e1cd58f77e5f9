//! Fuzz target for the sequence readers.
//!
//! Arbitrary input must produce records or errors, never a panic.

#![no_main]

use std::io::Cursor;

use kfcount::{format::SequenceFormat, reader::Sequences};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(sequences) = Sequences::from_reader(Cursor::new(data.to_vec()), SequenceFormat::Auto)
    else {
        return;
    };
    for record in sequences {
        if record.is_err() {
            break;
        }
    }
});
