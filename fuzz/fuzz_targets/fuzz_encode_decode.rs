//! Fuzz target for single-strand encoding.
//!
//! Every valid window must decode back to its lower-cased bases, and every
//! window holding a non-ACGT byte must be marked invalid.

#![no_main]

use kfcount::codec::KmerCodec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&first, seq)) = data.split_first() else {
        return;
    };
    let ksize = usize::from(first % 31) + 1;
    let codec = KmerCodec::<u64>::new(ksize, true).unwrap();

    let keys = codec.encode(seq);
    assert_eq!(keys.len(), seq.windows(ksize).count());

    for (window, &key) in seq.windows(ksize).zip(&keys) {
        let valid = window
            .iter()
            .all(|byte| matches!(byte.to_ascii_lowercase(), b'a' | b'c' | b'g' | b't'));
        assert_eq!(codec.is_invalid(key), !valid, "window {window:?}");
        if valid {
            assert_eq!(codec.decode(key).into_bytes(), window.to_ascii_lowercase());
        }
    }
});
