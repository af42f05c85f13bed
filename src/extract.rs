//! Extracting entry payloads.

use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::archive::Archive;
use crate::crc::Crc32Reader;
use crate::deflate::{self, DEFAULT_CHUNK_SIZE};
use crate::entry::{CompressionMethod, Entry, EntryKind};
use crate::error::{Result, RwZipError};

/// Options accepted by the extract operations.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Transfer granularity in bytes; bounds the memory footprint.
    pub chunk_size: usize,
    /// Skip checksum verification. Only sensible for fast listings where
    /// the payload bytes are discarded anyway.
    pub skip_crc: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_crc: false,
        }
    }
}

impl Archive {
    /// Stream an entry's payload into `sink`, verifying its checksum.
    /// Returns the number of bytes written.
    pub fn extract<W: Write>(&mut self, entry: &Entry, sink: &mut W) -> Result<u64> {
        self.extract_with(entry, sink, &ExtractOptions::default())
    }

    pub fn extract_with<W: Write>(
        &mut self,
        entry: &Entry,
        sink: &mut W,
        options: &ExtractOptions,
    ) -> Result<u64> {
        self.file.seek(SeekFrom::Start(entry.data_offset()))?;
        let transfer = match entry.compression_method() {
            CompressionMethod::Stored => {
                let mut limited = (&mut self.file).take(entry.uncompressed_size());
                deflate::store(&mut limited, sink, options.chunk_size)?
            }
            CompressionMethod::Deflate => {
                let limited = (&mut self.file).take(entry.compressed_size());
                deflate::decompress(limited, sink, options.chunk_size)?
            }
            CompressionMethod::Unsupported(v) => {
                return Err(RwZipError::InvalidCompressionMethod(v))
            }
        };
        if !options.skip_crc && transfer.crc32 != entry.crc32() {
            return Err(RwZipError::InvalidCrc32 {
                expected: entry.crc32(),
                actual: transfer.crc32,
            });
        }
        Ok(transfer.bytes_written)
    }

    /// Materialize an entry at `destination`: files are written (parent
    /// directories created as needed), directories are created empty, and
    /// symlinks become real links on Unix. Elsewhere the link target is
    /// written as the file's content.
    pub fn extract_to_path<P: AsRef<Path>>(&mut self, entry: &Entry, destination: P) -> Result<u64> {
        let destination = destination.as_ref();
        debug!("extracting {} to {}", entry.path(), destination.display());
        match entry.kind() {
            EntryKind::Directory => {
                std::fs::create_dir_all(destination)?;
                Ok(0)
            }
            EntryKind::Symlink => {
                let mut target = Vec::new();
                let written = self.extract(entry, &mut target)?;
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                materialize_symlink(&target, destination)?;
                Ok(written)
            }
            EntryKind::File => {
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let mut file = File::create(destination)?;
                self.extract(entry, &mut file)
            }
        }
    }

    /// A streaming reader over the entry's payload that inflates on the fly
    /// and verifies the checksum once the stream is exhausted.
    pub fn reader(&mut self, entry: &Entry) -> Result<Box<dyn Read + '_>> {
        self.file.seek(SeekFrom::Start(entry.data_offset()))?;
        match entry.compression_method() {
            CompressionMethod::Stored => {
                let limited = (&mut self.file).take(entry.uncompressed_size());
                Ok(Box::new(Crc32Reader::new(limited, entry.crc32())))
            }
            CompressionMethod::Deflate => {
                let limited = (&mut self.file).take(entry.compressed_size());
                let decoder = flate2::read::DeflateDecoder::new(limited);
                Ok(Box::new(Crc32Reader::new(decoder, entry.crc32())))
            }
            CompressionMethod::Unsupported(v) => Err(RwZipError::InvalidCompressionMethod(v)),
        }
    }
}

#[cfg(unix)]
fn materialize_symlink(target: &[u8], destination: &Path) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    if destination.symlink_metadata().is_ok() {
        std::fs::remove_file(destination)?;
    }
    std::os::unix::fs::symlink(OsStr::from_bytes(target), destination)?;
    Ok(())
}

#[cfg(not(unix))]
fn materialize_symlink(target: &[u8], destination: &Path) -> Result<()> {
    std::fs::write(destination, target)?;
    Ok(())
}
