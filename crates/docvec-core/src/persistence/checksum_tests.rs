//! Tests for `checksum` module

use super::checksum::{crc32, ids_fingerprint, Crc32};

#[test]
fn test_crc32_known_vector() {
    // Standard check value for "123456789".
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn test_crc32_empty_input() {
    assert_eq!(crc32(b""), 0);
}

#[test]
fn test_streaming_matches_one_shot() {
    let mut hasher = Crc32::new();
    hasher.update(b"1234");
    hasher.update(b"56789");

    assert_eq!(hasher.finish(), crc32(b"123456789"));
}

#[test]
fn test_ids_fingerprint_is_length_prefixed() {
    assert_ne!(ids_fingerprint(&["ab", "c"]), ids_fingerprint(&["a", "bc"]));
    assert_ne!(ids_fingerprint(&["a", "b"]), ids_fingerprint(&["b", "a"]));
    assert_eq!(
        ids_fingerprint(&["a".to_string()]),
        ids_fingerprint(&["a"])
    );
}
