//! The mutation engine: adding and removing entries in place.
//!
//! Both operations rewrite the central directory at the end of the file and
//! keep payload movement to the minimum the format allows. They are not
//! atomic across a crash: a failure mid-write leaves the archive in an
//! undefined state, and callers needing stronger guarantees must keep their
//! own backup. The session's in-memory end of central directory record is
//! only replaced once the on-disk one has been flushed.

use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

use crate::archive::{AccessMode, Archive};
use crate::codec::Record;
use crate::deflate::{self, DEFAULT_CHUNK_SIZE};
use crate::entry::{
    encode_path, CompressionMethod, Entry, EntryKind, MSDOS_DIR, S_IFDIR, S_IFLNK, S_IFREG,
};
use crate::error::{Result, RwZipError};
use crate::headers::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectoryRecord, LocalFileHeader,
    FLAG_DATA_DESCRIPTOR,
};
use crate::time::dos_date_time;

/// ZIP format version 2.0, the newest anything here needs.
const VERSION_ZIP_SPEC_2_0: u16 = 20;

/// Attribute-host byte of `version_made_by`: Unix.
const OS_UNIX_MADE_BY: u16 = 3 << 8;

/// Default POSIX mode stored with new entries.
pub const DEFAULT_PERMISSIONS: u16 = 0o755;

/// Options accepted by the add operations.
#[derive(Debug, Clone, Copy)]
pub struct AddOptions {
    /// Store or Deflate; ignored for directories and symlinks, which are
    /// always stored.
    pub compression: CompressionMethod,
    /// Transfer granularity in bytes; bounds the memory footprint.
    pub chunk_size: usize,
    /// POSIX mode bits placed in the high half of the external attributes.
    pub permissions: u16,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflate,
            chunk_size: DEFAULT_CHUNK_SIZE,
            permissions: DEFAULT_PERMISSIONS,
        }
    }
}

impl AddOptions {
    pub fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
            ..Self::default()
        }
    }
}

impl Archive {
    /// Add a file entry named `path`, streaming its payload from `source`.
    ///
    /// The new local header and payload overwrite the old central
    /// directory, which is rewritten behind them together with a fresh end
    /// of central directory record.
    pub fn add_entry<R: Read>(&mut self, path: &str, source: R, options: &AddOptions) -> Result<()> {
        self.add_entry_kind(path, EntryKind::File, source, options)
    }

    /// Add a filesystem item. `path` names the entry inside the archive and
    /// resolves against `base` to locate the source; directories become
    /// trailing-`/` entries and symlinks store their target path as the
    /// payload.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: &str, base: P, options: &AddOptions) -> Result<()> {
        let source = base.as_ref().join(path.trim_end_matches('/'));
        let metadata = std::fs::symlink_metadata(&source)?;
        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&source)?;
            let bytes = target.to_string_lossy().into_owned().into_bytes();
            self.add_entry_kind(path, EntryKind::Symlink, bytes.as_slice(), options)
        } else if metadata.is_dir() {
            let name = if path.ends_with('/') {
                path.to_string()
            } else {
                format!("{}/", path)
            };
            self.add_entry_kind(&name, EntryKind::Directory, std::io::empty(), options)
        } else {
            let file = File::open(&source)?;
            self.add_entry_kind(path, EntryKind::File, file, options)
        }
    }

    pub(crate) fn add_entry_kind<R: Read>(
        &mut self,
        path: &str,
        kind: EntryKind,
        mut source: R,
        options: &AddOptions,
    ) -> Result<()> {
        self.require_writable()?;
        if self.eocd.total_number_of_entries_in_central_directory == u16::MAX {
            return Err(RwZipError::UnwritableArchive(
                "archive is at the 65535-entry format limit".to_string(),
            ));
        }
        let method = match (kind, options.compression) {
            (EntryKind::File, CompressionMethod::Unsupported(v)) => {
                return Err(RwZipError::InvalidCompressionMethod(v))
            }
            (EntryKind::File, m) => m,
            // Directory and symlink payloads are tiny or empty; always store.
            _ => CompressionMethod::Stored,
        };
        let (name_bytes, encoding_flag) = encode_path(path)?;
        let flags = FLAG_DATA_DESCRIPTOR | encoding_flag;
        let (dos_date, dos_time) = dos_date_time(SystemTime::now());

        // The payload overwrites the old central directory, so keep a copy
        // to rewrite behind the new entry.
        let preserved_directory = self.read_central_directory_bytes()?;
        let local_offset = self.eocd.offset_to_start_of_central_directory as u64;

        // Sizes and CRC are unknown until the payload has streamed, so the
        // local header carries zeros and bit 3 points at the descriptor.
        let local = LocalFileHeader {
            version_needed_to_extract: VERSION_ZIP_SPEC_2_0,
            general_purpose_bit_flag: flags,
            compression_method: method.as_u16(),
            last_mod_file_time: dos_time,
            last_mod_file_date: dos_date,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            file_name: name_bytes.clone(),
            extra_field: Vec::new(),
        };
        self.file.seek(SeekFrom::Start(local_offset))?;
        self.file.write_all(&local.to_bytes())?;

        let transfer = match method {
            CompressionMethod::Deflate => {
                deflate::compress(&mut source, &mut self.file, options.chunk_size)?
            }
            _ => deflate::store(&mut source, &mut self.file, options.chunk_size)?,
        };
        if transfer.bytes_read > u32::MAX as u64 || transfer.bytes_written > u32::MAX as u64 {
            return Err(RwZipError::UnwritableArchive(format!(
                "entry {} exceeds the 4 GiB format limit",
                path
            )));
        }

        let descriptor = DataDescriptor {
            crc32: transfer.crc32,
            compressed_size: transfer.bytes_written as u32,
            uncompressed_size: transfer.bytes_read as u32,
        };
        self.file.write_all(&descriptor.to_bytes())?;

        let directory_offset = self.file.stream_position()?;
        if directory_offset > u32::MAX as u64 {
            return Err(RwZipError::InvalidStartOfCentralDirectoryOffset(
                directory_offset,
            ));
        }

        // Surviving headers keep their local offsets: nothing below the old
        // central directory start has moved.
        self.file.write_all(&preserved_directory)?;

        let central = CentralDirectoryHeader {
            version_made_by: OS_UNIX_MADE_BY | VERSION_ZIP_SPEC_2_0,
            version_needed_to_extract: VERSION_ZIP_SPEC_2_0,
            general_purpose_bit_flag: flags,
            compression_method: method.as_u16(),
            last_mod_file_time: dos_time,
            last_mod_file_date: dos_date,
            crc32: transfer.crc32,
            compressed_size: transfer.bytes_written as u32,
            uncompressed_size: transfer.bytes_read as u32,
            disk_number_start: 0,
            internal_file_attributes: 0,
            external_file_attributes: external_attributes(kind, options.permissions),
            relative_offset_of_local_header: local_offset as u32,
            file_name: name_bytes,
            extra_field: Vec::new(),
            file_comment: Vec::new(),
        };
        let central_bytes = central.to_bytes();
        self.file.write_all(&central_bytes)?;
        debug!(
            "added {} ({} -> {} bytes, crc {:08x})",
            path, transfer.bytes_read, transfer.bytes_written, transfer.crc32
        );

        let eocd = EndOfCentralDirectoryRecord {
            number_of_disk: 0,
            number_of_disk_start: 0,
            total_number_of_entries_on_this_disk: self
                .eocd
                .total_number_of_entries_on_this_disk
                + 1,
            total_number_of_entries_in_central_directory: self
                .eocd
                .total_number_of_entries_in_central_directory
                + 1,
            size_of_central_directory: self.eocd.size_of_central_directory
                + central_bytes.len() as u32,
            offset_to_start_of_central_directory: directory_offset as u32,
            zip_file_comment: self.eocd.zip_file_comment.clone(),
        };
        self.commit(eocd)
    }

    /// Remove `entry`, shifting everything behind it down over the hole and
    /// rebuilding the central directory without it.
    pub fn remove(&mut self, entry: &Entry) -> Result<()> {
        self.require_writable()?;

        // Snapshot every surviving header before the bytes move.
        let target_offset = entry.local_header_offset();
        let survivors: Vec<Entry> = self
            .entries()
            .filter(|e| e.local_header_offset() != target_offset)
            .collect();
        if survivors.len() == self.eocd.total_number_of_entries_in_central_directory as usize {
            return Err(RwZipError::EntryNotFound(entry.path()));
        }

        let (start, end) = entry.total_span();
        let directory_offset = self.eocd.offset_to_start_of_central_directory as u64;
        if end > directory_offset {
            return Err(RwZipError::UnreadableArchive(
                "entry extends past the central directory".to_string(),
            ));
        }
        let hole = end - start;

        // Shift the payload region after the entry down over it.
        let mut chunk = vec![0u8; DEFAULT_CHUNK_SIZE];
        let mut read_position = end;
        let mut write_position = start;
        while read_position < directory_offset {
            let n = ((directory_offset - read_position) as usize).min(chunk.len());
            self.file.seek(SeekFrom::Start(read_position))?;
            self.file.read_exact(&mut chunk[..n])?;
            self.file.seek(SeekFrom::Start(write_position))?;
            self.file.write_all(&chunk[..n])?;
            read_position += n as u64;
            write_position += n as u64;
        }

        // Rebuild the central directory with shifted offsets.
        self.file.seek(SeekFrom::Start(directory_offset - hole))?;
        let mut directory_size = 0u64;
        for survivor in &survivors {
            let mut header = survivor.central_directory_header.clone();
            if header.relative_offset_of_local_header as u64 >= end {
                header.relative_offset_of_local_header -= hole as u32;
            }
            let bytes = header.to_bytes();
            directory_size += bytes.len() as u64;
            self.file.write_all(&bytes)?;
        }
        debug!("removed {} ({} bytes reclaimed)", entry.path(), hole);

        let eocd = EndOfCentralDirectoryRecord {
            number_of_disk: 0,
            number_of_disk_start: 0,
            total_number_of_entries_on_this_disk: self
                .eocd
                .total_number_of_entries_on_this_disk
                - 1,
            total_number_of_entries_in_central_directory: self
                .eocd
                .total_number_of_entries_in_central_directory
                - 1,
            size_of_central_directory: directory_size as u32,
            offset_to_start_of_central_directory: (directory_offset - hole) as u32,
            zip_file_comment: self.eocd.zip_file_comment.clone(),
        };
        self.commit(eocd)
    }

    fn require_writable(&self) -> Result<()> {
        if self.mode == AccessMode::Read {
            return Err(RwZipError::UnwritableArchive(format!(
                "{} was opened read-only",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn read_central_directory_bytes(&mut self) -> Result<Vec<u8>> {
        let offset = self.eocd.offset_to_start_of_central_directory as u64;
        let size = self.eocd.size_of_central_directory as usize;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; size];
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the new end of central directory record at the current
    /// position, flush, adopt it in memory, and cut the file at the write
    /// head.
    fn commit(&mut self, eocd: EndOfCentralDirectoryRecord) -> Result<()> {
        self.file.write_all(&eocd.to_bytes())?;
        let end = self.file.stream_position()?;
        self.file.flush()?;
        self.file.set_len(end)?;
        self.eocd = eocd;
        Ok(())
    }
}

fn external_attributes(kind: EntryKind, permissions: u16) -> u32 {
    let mode = match kind {
        EntryKind::File => S_IFREG | permissions as u32,
        EntryKind::Directory => S_IFDIR | permissions as u32,
        EntryKind::Symlink => S_IFLNK | permissions as u32,
    };
    let dos_attributes = if kind == EntryKind::Directory {
        MSDOS_DIR
    } else {
        0
    };
    (mode << 16) | dos_attributes
}
