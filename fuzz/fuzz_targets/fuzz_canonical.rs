//! Fuzz target for canonical encoding.
//!
//! Checks that:
//! 1. A window and its reverse complement share a key
//! 2. The rolling encoder agrees with encoding each window alone
//! 3. Converting the single-strand key gives the same canonical key

#![no_main]

use kfcount::codec::KmerCodec;
use libfuzzer_sys::fuzz_target;

fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'a' => b't',
            b't' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            _ => unreachable!(),
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let Some((&first, bases)) = data.split_first() else {
        return;
    };
    let ksize = 2 * usize::from(first % 16) + 1;
    let seq: Vec<u8> = bases.iter().map(|&b| b"acgt"[usize::from(b & 3)]).collect();

    let canonical = KmerCodec::<u64>::new(ksize, false).unwrap();
    let single = KmerCodec::<u64>::new(ksize, true).unwrap();

    let keys = canonical.encode(&seq);
    for (window, &key) in seq.windows(ksize).zip(&keys) {
        assert_eq!(key, canonical.encode_one(window));
        assert_eq!(key, canonical.encode_one(&reverse_complement(window)));
        assert_eq!(single.ss_to_ds(single.encode_one(window)).ok(), Some(key));
    }
});
