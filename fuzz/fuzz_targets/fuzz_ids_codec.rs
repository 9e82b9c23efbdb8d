//! Fuzz target for the id file decoder.

#![no_main]

use docvec_core::persistence::{decode_ids, encode_ids};
use docvec_core::IdMapping;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(ids) = decode_ids(data) {
        let _ = IdMapping::from_ids(ids.clone());
        let encoded = encode_ids(&ids).expect("encode");
        assert_eq!(decode_ids(&encoded).expect("decode"), ids);
    }
});
