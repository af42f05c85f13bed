//! Little-endian serialization for the on-disk ZIP structures.
//!
//! Every structure has a fixed-length prefix followed by zero or more
//! variable-length regions (filename, extra field, comments) whose lengths
//! are declared inside the prefix. [`Record`] captures that shape once so
//! the header layer doesn't repeat the seek/read/validate dance.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, RwZipError};

/// A fixed-prefix on-disk structure with optional trailing variable-length
/// regions.
pub(crate) trait Record: Sized {
    /// Size of the fixed-length prefix in bytes, signature included.
    const FIXED_SIZE: usize;

    /// Parse from the fixed prefix. `tail` supplies each trailing
    /// variable-length region in declared order.
    fn parse<F>(fixed: &[u8], tail: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Vec<u8>>;

    /// Serialize the whole record, trailing regions included.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Seek to `offset` and parse a record, pulling its trailing regions
/// directly from the stream.
pub(crate) fn read_record<T: Record, R: Read + Seek>(reader: &mut R, offset: u64) -> Result<T> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut fixed = vec![0u8; T::FIXED_SIZE];
    reader.read_exact(&mut fixed)?;
    T::parse(&fixed, |len| {
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    })
}

pub(crate) fn bad_signature(name: &'static str) -> RwZipError {
    RwZipError::UnreadableArchive(format!("invalid {} signature", name))
}
