//! Filesystem conveniences layered over the core: archive a directory
//! tree, extract an archive. Relative path structure and directory markers
//! (trailing `/`) are preserved both ways.

use log::debug;
use std::io;
use std::path::{Path, MAIN_SEPARATOR};
use walkdir::WalkDir;

use crate::archive::{AccessMode, Archive};
use crate::error::{Result, RwZipError};
use crate::write::AddOptions;

/// Create `destination` and archive `source` (a file or a directory tree)
/// into it.
pub fn zip_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    options: &AddOptions,
) -> Result<()> {
    let source = source.as_ref();
    let mut archive = Archive::open(destination, AccessMode::Create)?;
    let base = source.parent().unwrap_or(source);
    for item in WalkDir::new(source).follow_links(false) {
        let item = item.map_err(io::Error::from)?;
        let relative = item
            .path()
            .strip_prefix(base)
            .unwrap_or_else(|_| item.path());
        let mut name = relative.to_string_lossy().replace(MAIN_SEPARATOR, "/");
        if name.is_empty() {
            continue;
        }
        if item.file_type().is_dir() {
            name.push('/');
        }
        debug!("archiving {}", name);
        archive.add_file(&name, base, options)?;
    }
    Ok(())
}

/// Extract every entry of the archive at `source` under `destination`.
pub fn unzip_archive<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<()> {
    let destination = destination.as_ref();
    let mut archive = Archive::open(source, AccessMode::Read)?;
    std::fs::create_dir_all(destination)?;
    let entries: Vec<_> = archive.entries().collect();
    for entry in entries {
        let path = entry.path();
        reject_escaping_path(&path)?;
        let target = destination.join(
            path.trim_end_matches('/')
                .replace('/', &MAIN_SEPARATOR.to_string()),
        );
        archive.extract_to_path(&entry, &target)?;
    }
    Ok(())
}

/// Refuse entry paths that would land outside the destination.
fn reject_escaping_path(path: &str) -> Result<()> {
    if path.starts_with('/') || path.split('/').any(|component| component == "..") {
        return Err(RwZipError::InvalidEntryPath(path.to_string()));
    }
    Ok(())
}
