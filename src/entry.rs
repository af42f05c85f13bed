//! Archive entries and their derived metadata.
//!
//! An [`Entry`] is a value snapshot of the three on-disk structures
//! describing one archived item, taken at iteration time. It stays valid
//! across later mutations of the session (though its offsets may then point
//! at moved bytes). The central directory header is authoritative for sizes
//! and CRC; the local header only contributes the payload location.

use codepage_437::{BorrowFromCp437, CP437_CONTROL};
use std::borrow::Cow;

use crate::codec::Record;
use crate::error::{Result, RwZipError};
use crate::headers::{
    CentralDirectoryHeader, DataDescriptor, LocalFileHeader, FLAG_UTF8,
};
use crate::time::{dos_date_components, dos_time_components};

/// Unix file type mask and the types the format distinguishes.
pub(crate) const S_IFMT: u32 = 0o170000;
pub(crate) const S_IFLNK: u32 = 0o120000;
pub(crate) const S_IFREG: u32 = 0o100000;
pub(crate) const S_IFDIR: u32 = 0o040000;

/// MS-DOS directory attribute bit.
pub(crate) const MSDOS_DIR: u32 = 0x10;

const OS_MSDOS: u8 = 0;
const OS_UNIX: u8 = 3;
const OS_MACOS: u8 = 19;

/// How an entry's payload is transformed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression
    Stored,
    /// DEFLATE (RFC 1951)
    Deflate,
    /// Anything else; carried for diagnostics, never extractable
    Unsupported(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            v => CompressionMethod::Unsupported(v),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unsupported(v) => *v,
        }
    }
}

/// What an entry represents on a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One archived item: central directory header, local file header, and the
/// trailing data descriptor when general purpose bit 3 is set.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) central_directory_header: CentralDirectoryHeader,
    pub(crate) local_file_header: LocalFileHeader,
    pub(crate) data_descriptor: Option<DataDescriptor>,
}

impl Entry {
    /// The entry's path, `/`-separated; directories end in `/`.
    pub fn path(&self) -> String {
        decode_path(
            &self.central_directory_header.file_name,
            self.central_directory_header.is_utf8(),
        )
    }

    /// What the entry materializes as, derived from the OS that made it,
    /// its external attributes, and the trailing-`/` convention.
    pub fn kind(&self) -> EntryKind {
        let header = &self.central_directory_header;
        let os = (header.version_made_by >> 8) as u8;
        let mode = header.external_file_attributes >> 16;
        let trailing_slash = header.file_name.last() == Some(&b'/');
        match os {
            OS_UNIX | OS_MACOS => {
                if mode & S_IFMT == S_IFLNK {
                    EntryKind::Symlink
                } else if mode & S_IFMT == S_IFDIR || trailing_slash {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                }
            }
            OS_MSDOS => {
                if trailing_slash || header.external_file_attributes & MSDOS_DIR != 0 {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                }
            }
            _ => {
                if trailing_slash {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                }
            }
        }
    }

    pub fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.central_directory_header.compression_method)
    }

    /// Size of the payload after decompression.
    pub fn uncompressed_size(&self) -> u64 {
        self.central_directory_header.uncompressed_size as u64
    }

    /// Size of the payload as stored.
    pub fn compressed_size(&self) -> u64 {
        self.central_directory_header.compressed_size as u64
    }

    /// CRC-32 of the uncompressed payload, as recorded in the central
    /// directory.
    pub fn crc32(&self) -> u32 {
        self.central_directory_header.crc32
    }

    /// Offset of the entry's local header from the start of the archive.
    pub fn local_header_offset(&self) -> u64 {
        self.central_directory_header.relative_offset_of_local_header as u64
    }

    /// POSIX mode bits, when the entry was made on a Unix-like system.
    pub fn unix_mode(&self) -> Option<u16> {
        let os = (self.central_directory_header.version_made_by >> 8) as u8;
        match os {
            OS_UNIX | OS_MACOS => {
                Some((self.central_directory_header.external_file_attributes >> 16) as u16)
            }
            _ => None,
        }
    }

    /// Modification date as `(year, month, day)`.
    pub fn modified_date(&self) -> (u16, u8, u8) {
        dos_date_components(self.central_directory_header.last_mod_file_date)
    }

    /// Modification time as `(hour, minute, second)`.
    pub fn modified_time(&self) -> (u8, u8, u8) {
        dos_time_components(self.central_directory_header.last_mod_file_time)
    }

    /// The entry's file comment, if any.
    pub fn comment(&self) -> String {
        decode_path(
            &self.central_directory_header.file_comment,
            self.central_directory_header.is_utf8(),
        )
    }

    /// Where the payload bytes begin. The local header's variable lengths
    /// are the ones that count here; they may differ from the central
    /// directory's.
    pub(crate) fn data_offset(&self) -> u64 {
        self.local_header_offset() + self.local_file_header.total_size()
    }

    /// On-disk payload length: the compressed span for Deflate, the
    /// uncompressed one for Store.
    pub(crate) fn stored_payload_size(&self) -> u64 {
        match self.compression_method() {
            CompressionMethod::Deflate => self.central_directory_header.compressed_size as u64,
            _ => self.central_directory_header.uncompressed_size as u64,
        }
    }

    /// The half-open byte range `[start, end)` the entry occupies, local
    /// header through payload and trailing descriptor.
    pub(crate) fn total_span(&self) -> (u64, u64) {
        let start = self.local_header_offset();
        let mut end = self.data_offset() + self.stored_payload_size();
        if self.central_directory_header.has_data_descriptor() {
            end += DataDescriptor::FIXED_SIZE as u64;
        }
        (start, end)
    }
}

/// Decode filename bytes per general purpose bit 11: UTF-8 when set,
/// CP437 otherwise.
pub(crate) fn decode_path(bytes: &[u8], utf8: bool) -> String {
    if utf8 {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        let decoded: Cow<str> = Cow::borrow_from_cp437(bytes, &CP437_CONTROL);
        decoded.into_owned()
    }
}

/// Encode an entry path for storage. ASCII paths are CP437-compatible and
/// stored unflagged; anything else is stored as UTF-8 with bit 11 set.
pub(crate) fn encode_path(path: &str) -> Result<(Vec<u8>, u16)> {
    if path.is_empty() {
        return Err(RwZipError::InvalidEntryPath(path.to_string()));
    }
    if path.is_ascii() {
        Ok((path.as_bytes().to_vec(), 0))
    } else {
        Ok((path.as_bytes().to_vec(), FLAG_UTF8))
    }
}
