//! Tests for `error` module

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors: Vec<Error> = vec![
        Error::InvalidArgument("k".into()),
        Error::EmptyIndex,
        Error::DimensionMismatch {
            expected: 384,
            actual: 128,
        },
        Error::CorruptPersistedState("crc".into()),
        Error::ResourceExhausted("oom".into()),
        Error::Embedding("model".into()),
        Error::Config("bad".into()),
        Error::Io(std::io::Error::other("disk")),
        Error::Serialization("bincode".into()),
    ];

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    for code in &codes {
        assert!(code.starts_with("DOCVEC-"), "Code {code} should start with DOCVEC-");
    }
}

#[test]
fn test_error_display_includes_code() {
    let err = Error::DimensionMismatch {
        expected: 384,
        actual: 3,
    };

    let display = err.to_string();

    assert!(display.contains("[DOCVEC-003]"));
    assert!(display.contains("expected 384, got 3"));
}

#[test]
fn test_empty_index_reads_as_not_found() {
    let display = Error::EmptyIndex.to_string();
    assert!(display.contains("no documents indexed"));
}

#[test]
fn test_recoverability() {
    assert!(Error::InvalidArgument("k".into()).is_recoverable());
    assert!(Error::EmptyIndex.is_recoverable());
    assert!(!Error::CorruptPersistedState("x".into()).is_recoverable());
    assert!(!Error::ResourceExhausted("x".into()).is_recoverable());
}

#[test]
fn test_try_reserve_error_maps_to_resource_exhausted() {
    let mut v: Vec<u64> = Vec::new();
    let err = v.try_reserve(usize::MAX).expect_err("must overflow");

    let converted: Error = err.into();

    assert_eq!(converted.code(), "DOCVEC-005");
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}
