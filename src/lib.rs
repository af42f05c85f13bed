//! # rw-zip: Read, Create, and Modify ZIP Archives
//!
//! `rw-zip` is a small ZIP library built around an archive *session*: open a
//! file once, then list, extract, add, and remove entries against it. Writes
//! happen in place by rewriting the central directory at the tail of the
//! file, so adding or removing an entry never copies the untouched payloads.
//!
//! ## Features
//!
//! - **Read, Create, Update**: one session type for all three access modes
//! - **Streaming I/O**: payloads move through fixed 16 KiB chunks, so memory
//!   use stays flat regardless of entry size
//! - **Store and Deflate**: with CRC-32 verification on extraction
//! - **In-place mutation**: add and remove entries without rebuilding the
//!   whole archive
//! - **Preview**: reassemble the flat entry list into a folder tree
//!
//! Not supported: ZIP64 (archives over 4 GiB or 65535 entries), encryption,
//! and multi-disk archives.
//!
//! ## Quick Start
//!
//! ### Reading an archive
//!
//! ```no_run
//! use rw_zip::{AccessMode, Archive};
//!
//! let mut archive = Archive::open("archive.zip", AccessMode::Read)?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.path(), entry.uncompressed_size());
//! }
//!
//! if let Some(entry) = archive.get("file.txt") {
//!     let mut data = Vec::new();
//!     archive.extract(&entry, &mut data)?;
//! }
//! # Ok::<(), rw_zip::RwZipError>(())
//! ```
//!
//! ### Creating and modifying an archive
//!
//! ```no_run
//! use rw_zip::{AccessMode, AddOptions, Archive};
//!
//! let mut archive = Archive::open("output.zip", AccessMode::Create)?;
//! archive.add_entry("hello.txt", &b"Hello, World!"[..], &AddOptions::default())?;
//! archive.add_entry("notes/todo.txt", &b"ship it"[..], &AddOptions::stored())?;
//!
//! if let Some(entry) = archive.get("hello.txt") {
//!     archive.remove(&entry)?;
//! }
//! # Ok::<(), rw_zip::RwZipError>(())
//! ```

pub mod archive;
pub mod entry;
pub mod error;
pub mod extract;
pub mod ops;
pub mod preview;
pub mod write;

mod codec;
mod crc;
mod deflate;
mod headers;
mod time;

pub use archive::{AccessMode, Archive, Entries};
pub use deflate::DEFAULT_CHUNK_SIZE;
pub use entry::{CompressionMethod, Entry, EntryKind};
pub use error::{Result, RwZipError};
pub use extract::ExtractOptions;
pub use ops::{unzip_archive, zip_directory};
pub use preview::{Preview, PreviewFile, PreviewFolder};
pub use write::{AddOptions, DEFAULT_PERMISSIONS};
