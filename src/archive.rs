//! Archive sessions: open, scan, iterate, look up.

use log::{debug, trace};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{read_record, Record};
use crate::entry::{decode_path, Entry};
use crate::error::{Result, RwZipError};
use crate::headers::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectoryRecord, LocalFileHeader,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE,
};

/// How far back from EOF the EOCD scan walks: the 22-byte record plus a
/// maximal comment, rounded up.
const MAX_EOCD_SCAN: u64 = 66_000;

/// How a session may touch its backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Existing archive, no mutation
    Read,
    /// New archive; the target must not exist yet
    Create,
    /// Existing archive, mutation allowed
    Update,
}

/// An open ZIP archive.
///
/// A session exclusively owns its backing file for its whole lifetime and is
/// not safe for concurrent use. The position of the underlying stream after
/// any public operation is unspecified. The file is released when the
/// session is dropped.
pub struct Archive {
    pub(crate) path: PathBuf,
    pub(crate) mode: AccessMode,
    pub(crate) file: File,
    pub(crate) eocd: EndOfCentralDirectoryRecord,
}

impl Archive {
    /// Open an archive session.
    ///
    /// * `Read` fails if the file is missing or unreadable, or holds no end
    ///   of central directory record.
    /// * `Create` fails if the file already exists; the new file's sole
    ///   content is an empty 22-byte end of central directory record.
    /// * `Update` fails if the file is missing or not writable.
    pub fn open<P: AsRef<Path>>(path: P, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match mode {
            AccessMode::Read => {
                let mut file = File::open(&path).map_err(|e| {
                    RwZipError::UnreadableArchive(format!("{}: {}", path.display(), e))
                })?;
                let eocd = scan_for_eocd(&mut file)?;
                debug!("opened {} for reading, {} entries", path.display(), eocd.total_number_of_entries_in_central_directory);
                Ok(Self { path, mode, file, eocd })
            }
            AccessMode::Create => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .map_err(|e| {
                        RwZipError::UnwritableArchive(format!("{}: {}", path.display(), e))
                    })?;
                let eocd = EndOfCentralDirectoryRecord::default();
                file.write_all(&eocd.to_bytes())?;
                file.flush()?;
                debug!("created {}", path.display());
                Ok(Self { path, mode, file, eocd })
            }
            AccessMode::Update => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&path)
                    .map_err(|e| {
                        RwZipError::UnwritableArchive(format!("{}: {}", path.display(), e))
                    })?;
                let eocd = scan_for_eocd(&mut file)?;
                file.seek(SeekFrom::Start(0))?;
                debug!("opened {} for update, {} entries", path.display(), eocd.total_number_of_entries_in_central_directory);
                Ok(Self { path, mode, file, eocd })
            }
        }
    }

    /// Iterate entries in central-directory order. Each call starts a fresh
    /// pass over the directory; iteration stops early if a structure is
    /// unreadable.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            file: &mut self.file,
            offset: self.eocd.offset_to_start_of_central_directory as u64,
            remaining: self.eocd.total_number_of_entries_in_central_directory,
        }
    }

    /// The first entry whose path matches `path` exactly. The format
    /// permits duplicate paths; later duplicates are not reachable here.
    pub fn get(&mut self, path: &str) -> Option<Entry> {
        self.entries().find(|e| e.path() == path)
    }

    /// Number of entries recorded in the end of central directory record.
    pub fn len(&self) -> usize {
        self.eocd.total_number_of_entries_in_central_directory as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The archive-level comment.
    pub fn comment(&self) -> String {
        decode_path(&self.eocd.zip_file_comment, false)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

/// Restartable pull cursor over the central directory: a running byte
/// offset plus a countdown of the entries left to yield.
pub struct Entries<'a> {
    file: &'a mut File,
    offset: u64,
    remaining: u16,
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        if self.remaining == 0 {
            return None;
        }
        match read_entry_at(self.file, self.offset) {
            Ok(entry) => {
                self.offset += entry.central_directory_header.total_size();
                self.remaining -= 1;
                Some(entry)
            }
            Err(err) => {
                debug!("stopping iteration: {}", err);
                self.remaining = 0;
                None
            }
        }
    }
}

/// Parse the full entry anchored at the central directory offset.
pub(crate) fn read_entry_at(file: &mut File, cd_offset: u64) -> Result<Entry> {
    let header: CentralDirectoryHeader = read_record(file, cd_offset)?;
    trace!("central directory header at {}: {:?}", cd_offset, header);
    read_entry_structures(file, header)
}

/// Resolve a central directory header into a complete [`Entry`] by reading
/// its local header and, under general purpose bit 3, its data descriptor.
pub(crate) fn read_entry_structures(
    file: &mut File,
    header: CentralDirectoryHeader,
) -> Result<Entry> {
    let local_offset = header.relative_offset_of_local_header as u64;
    let local: LocalFileHeader = read_record(file, local_offset)?;
    let data_descriptor = if header.has_data_descriptor() {
        // The descriptor sits right after the payload, whose on-disk length
        // is the compressed size for Deflate and the uncompressed size for
        // Store.
        let payload = match header.compression_method {
            8 => header.compressed_size as u64,
            _ => header.uncompressed_size as u64,
        };
        let descriptor_offset = local_offset
            + LocalFileHeader::FIXED_SIZE as u64
            + local.file_name.len() as u64
            + local.extra_field.len() as u64
            + payload;
        Some(read_record::<DataDescriptor, _>(file, descriptor_offset)?)
    } else {
        None
    };
    Ok(Entry {
        central_directory_header: header,
        local_file_header: local,
        data_descriptor,
    })
}

/// Walk backwards from EOF looking for the EOCD signature, then parse the
/// full record (comment included).
fn scan_for_eocd(file: &mut File) -> Result<EndOfCentralDirectoryRecord> {
    let length = file.seek(SeekFrom::End(0))?;
    if length < EndOfCentralDirectoryRecord::FIXED_SIZE as u64 {
        return Err(RwZipError::MissingEndOfCentralDirectoryRecord);
    }
    let scan_start = length.saturating_sub(MAX_EOCD_SCAN);
    file.seek(SeekFrom::Start(scan_start))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let signature = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes();
    let last = buffer.len() - EndOfCentralDirectoryRecord::FIXED_SIZE;
    for i in (0..=last).rev() {
        if buffer[i..i + 4] == signature {
            let offset = scan_start + i as u64;
            let record: EndOfCentralDirectoryRecord = read_record(file, offset)?;
            trace!("end of central directory record at {}: {:?}", offset, record);
            let directory_end = record.offset_to_start_of_central_directory as u64
                + record.size_of_central_directory as u64;
            let comment_length = record.zip_file_comment.len() as u64;
            if directory_end
                > length.saturating_sub(EndOfCentralDirectoryRecord::FIXED_SIZE as u64 + comment_length)
            {
                return Err(RwZipError::UnreadableArchive(
                    "central directory extends past the end of the archive".to_string(),
                ));
            }
            return Ok(record);
        }
    }
    Err(RwZipError::MissingEndOfCentralDirectoryRecord)
}
