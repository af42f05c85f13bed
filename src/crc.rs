//! CRC-32 helpers shared by the streaming paths.

use crc32fast::Hasher;
use std::io::{self, Read};

/// Fold `bytes` into a running CRC-32 (IEEE polynomial, seed 0).
pub(crate) fn crc32(prev: u32, bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(prev);
    hasher.update(bytes);
    hasher.finalize()
}

/// Reader that hashes everything passing through it and fails at EOF when
/// the result doesn't match the checksum recorded in the archive.
pub(crate) struct Crc32Reader<R> {
    inner: R,
    hasher: Hasher,
    expected: u32,
}

impl<R> Crc32Reader<R> {
    pub(crate) fn new(inner: R, expected: u32) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            expected,
        }
    }

    fn matches(&self) -> bool {
        self.hasher.clone().finalize() == self.expected
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() && !self.matches() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "CRC-32 mismatch",
                ))
            }
            Ok(n) => n,
            Err(e) => return Err(e),
        };
        self.hasher.update(&buf[..count]);
        Ok(count)
    }
}
