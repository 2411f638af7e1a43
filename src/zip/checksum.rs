use crc32fast::Hasher;

/// Running CRC-32 over an entry's uncompressed bytes.
///
/// Uses the standard polynomial ZIP readers expect, folds data in
/// incrementally, and never buffers the input. One unit is created per
/// entry and consumed by [`finalize`](Crc32::finalize).
pub struct Crc32 {
    hasher: Hasher,
    bytes: u64,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
            bytes: 0,
        }
    }

    /// Fold a chunk of bytes into the running checksum.
    pub fn update(&mut self, buf: &[u8]) {
        self.hasher.update(buf);
        self.bytes += buf.len() as u64;
    }

    /// Total number of bytes folded in so far.
    pub fn bytes_seen(&self) -> u64 {
        self.bytes
    }

    /// Consume the unit and return the checksum value.
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
