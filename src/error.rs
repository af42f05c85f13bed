//! Error types for rw-zip

use std::io;

/// Result type for rw-zip operations
pub type Result<T> = std::result::Result<T, RwZipError>;

/// Error types that can occur while working with an archive
#[derive(Debug)]
pub enum RwZipError {
    /// Low-level I/O error on the backing stream
    Io(io::Error),
    /// The archive could not be read: malformed structures or bad signatures
    UnreadableArchive(String),
    /// The archive cannot be written: read-only session, existing create
    /// target, or an unwritable file
    UnwritableArchive(String),
    /// An entry path is empty or cannot be stored
    InvalidEntryPath(String),
    /// An entry uses a compression method other than Store or Deflate
    InvalidCompressionMethod(u16),
    /// A write would push the central directory past the 32-bit offset limit
    InvalidStartOfCentralDirectoryOffset(u64),
    /// No End of Central Directory record within scanning distance of EOF
    MissingEndOfCentralDirectoryRecord,
    /// Recomputed checksum of extracted data does not match the recorded one
    InvalidCrc32 { expected: u32, actual: u32 },
    /// Entry not found in the archive
    EntryNotFound(String),
}

impl std::fmt::Display for RwZipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RwZipError::Io(e) => write!(f, "I/O error: {}", e),
            RwZipError::UnreadableArchive(msg) => write!(f, "Unreadable archive: {}", msg),
            RwZipError::UnwritableArchive(msg) => write!(f, "Unwritable archive: {}", msg),
            RwZipError::InvalidEntryPath(path) => write!(f, "Invalid entry path: {:?}", path),
            RwZipError::InvalidCompressionMethod(method) => {
                write!(f, "Invalid compression method: {}", method)
            }
            RwZipError::InvalidStartOfCentralDirectoryOffset(offset) => {
                write!(
                    f,
                    "Central directory offset {} exceeds the format limit",
                    offset
                )
            }
            RwZipError::MissingEndOfCentralDirectoryRecord => {
                write!(f, "Missing end of central directory record")
            }
            RwZipError::InvalidCrc32 { expected, actual } => {
                write!(
                    f,
                    "CRC-32 mismatch: expected {:08x}, got {:08x}",
                    expected, actual
                )
            }
            RwZipError::EntryNotFound(path) => write!(f, "Entry not found: {}", path),
        }
    }
}

impl std::error::Error for RwZipError {}

impl From<io::Error> for RwZipError {
    fn from(err: io::Error) -> Self {
        RwZipError::Io(err)
    }
}
