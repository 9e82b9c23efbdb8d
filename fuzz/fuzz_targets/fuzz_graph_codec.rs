//! Fuzz target for the graph file decoder.
//!
//! `decode_graph` reads counts from untrusted bytes and allocates from
//! them. It must reject any malformed input with an error: no panic, no
//! allocation beyond what the input length can justify.

#![no_main]

use docvec_core::persistence::{decode_graph, encode_graph};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(decoded) = decode_graph(data) {
        // Anything accepted must re-encode to the same bytes.
        let reencoded = encode_graph(&decoded.graph, decoded.ids_crc).expect("re-encode");
        assert_eq!(reencoded, data);
    }
});
