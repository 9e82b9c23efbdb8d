//! CRC32 (IEEE 802.3 polynomial), table-driven.
//!
//! Guards every persisted artifact and fingerprints the id sequence so the
//! graph file can prove which id prefix it was written against.

const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Streaming CRC32 hasher.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    /// Starts a new checksum.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    /// Feeds bytes into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
            crc = (crc >> 8) ^ CRC32_TABLE[idx];
        }
        self.state = crc;
    }

    /// Returns the final checksum.
    #[must_use]
    pub const fn finish(&self) -> u32 {
        !self.state
    }
}

/// One-shot CRC32 of `data`.
#[inline]
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finish()
}

/// Fingerprint of an ordered id sequence.
///
/// Each id is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
#[must_use]
pub fn ids_fingerprint<S: AsRef<str>>(ids: &[S]) -> u32 {
    let mut hasher = Crc32::new();
    for id in ids {
        let bytes = id.as_ref().as_bytes();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hasher.finish()
}
