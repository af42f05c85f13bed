//! Folder/file tree reconstruction for archive preview.
//!
//! The scan is deliberately forgiving: an entry whose local structures
//! can't be read is skipped, and only an unreadable central directory
//! header stops the pass. The resulting flat list is reassembled into
//! nested folders by path depth, parents owning their children.

use log::debug;
use std::collections::BTreeMap;

use crate::archive::{read_entry_structures, Archive};
use crate::codec::read_record;
use crate::entry::EntryKind;
use crate::error::Result;
use crate::headers::CentralDirectoryHeader;

/// A file in a [`Preview`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFile {
    pub path: String,
    pub size: u64,
}

/// A folder in a [`Preview`] tree, owning its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFolder {
    pub path: String,
    pub size: u64,
    pub files: Vec<PreviewFile>,
    pub folders: Vec<PreviewFolder>,
}

/// The archive reassembled as nested folders, plus any top-level files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub folders: Vec<PreviewFolder>,
    pub files: Vec<PreviewFile>,
}

/// One item surfaced by the preview scan: `(is_folder, path, size)`.
type ScanItem = (bool, String, u64);

impl Archive {
    /// Rebuild the archive's listing as a tree of folders and files.
    pub fn preview(&mut self) -> Result<Preview> {
        let mut items: Vec<ScanItem> = Vec::new();
        let mut offset = self.eocd.offset_to_start_of_central_directory as u64;
        for _ in 0..self.eocd.total_number_of_entries_in_central_directory {
            let header: CentralDirectoryHeader = match read_record(&mut self.file, offset) {
                Ok(header) => header,
                Err(err) => {
                    debug!("preview stopped: {}", err);
                    break;
                }
            };
            offset += header.total_size();
            match read_entry_structures(&mut self.file, header) {
                Ok(entry) => {
                    let is_folder = entry.kind() == EntryKind::Directory;
                    items.push((is_folder, entry.path(), entry.uncompressed_size()));
                }
                Err(err) => debug!("preview skipping entry: {}", err),
            }
        }
        Ok(build_tree(items))
    }
}

/// Path depth: component count with the trailing `/` trimmed, minus one.
/// `docs` and `top.txt` are depth 0, `docs/img/` depth 1.
fn depth(path: &str) -> usize {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.split('/').count() - 1
}

/// True when `folder` is the immediate prefix of `path`.
fn is_prefix_of(folder: &str, path: &str) -> bool {
    let trimmed = folder.trim_end_matches('/');
    path.len() > trimmed.len() + 1
        && path.starts_with(trimmed)
        && path.as_bytes()[trimmed.len()] == b'/'
}

fn build_tree(items: Vec<ScanItem>) -> Preview {
    let mut folders_by_depth: BTreeMap<usize, Vec<PreviewFolder>> = BTreeMap::new();
    let mut files_by_depth: BTreeMap<usize, Vec<PreviewFile>> = BTreeMap::new();
    for (is_folder, path, size) in items {
        let level = depth(&path);
        if is_folder {
            folders_by_depth.entry(level).or_default().push(PreviewFolder {
                path,
                size,
                files: Vec::new(),
                folders: Vec::new(),
            });
        } else {
            files_by_depth
                .entry(level)
                .or_default()
                .push(PreviewFile { path, size });
        }
    }

    // Attach each file to the first enclosing folder one level up; depth-0
    // files have no enclosing folder and surface at the top level.
    let mut top_level_files = Vec::new();
    for (level, files) in files_by_depth {
        for file in files {
            if level == 0 {
                top_level_files.push(file);
                continue;
            }
            let parent = folders_by_depth
                .get_mut(&(level - 1))
                .and_then(|candidates| {
                    candidates
                        .iter_mut()
                        .find(|folder| is_prefix_of(&folder.path, &file.path))
                });
            match parent {
                Some(folder) => folder.files.push(file),
                None => debug!("no enclosing folder for {}", file.path),
            }
        }
    }

    // Fold folder levels bottom-up: each folder attaches to the first
    // folder on the next shallower level whose path prefixes it.
    let mut levels: Vec<usize> = folders_by_depth.keys().copied().collect();
    levels.sort_unstable();
    while levels.len() > 1 {
        let deepest = levels.pop().expect("levels is non-empty");
        let parent_level = *levels.last().expect("a shallower level remains");
        let children = folders_by_depth.remove(&deepest).unwrap_or_default();
        for child in children {
            let parent = folders_by_depth
                .get_mut(&parent_level)
                .and_then(|candidates| {
                    candidates
                        .iter_mut()
                        .find(|folder| is_prefix_of(&folder.path, &child.path))
                });
            match parent {
                Some(folder) => folder.folders.push(child),
                None => debug!("no enclosing folder for {}", child.path),
            }
        }
    }

    Preview {
        folders: levels
            .first()
            .and_then(|level| folders_by_depth.remove(level))
            .unwrap_or_default(),
        files: top_level_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_components() {
        assert_eq!(depth("top.txt"), 0);
        assert_eq!(depth("docs/"), 0);
        assert_eq!(depth("docs/readme.md"), 1);
        assert_eq!(depth("docs/img/"), 1);
        assert_eq!(depth("docs/img/a.png"), 2);
    }

    #[test]
    fn nested_folders_and_files_reassemble() {
        let preview = build_tree(vec![
            (true, "docs/".to_string(), 0),
            (false, "docs/readme.md".to_string(), 120),
            (true, "docs/img/".to_string(), 0),
            (false, "docs/img/a.png".to_string(), 2048),
        ]);
        assert_eq!(preview.folders.len(), 1);
        assert!(preview.files.is_empty());
        let docs = &preview.folders[0];
        assert_eq!(docs.path, "docs/");
        assert_eq!(docs.files.len(), 1);
        assert_eq!(docs.files[0].path, "docs/readme.md");
        assert_eq!(docs.folders.len(), 1);
        let img = &docs.folders[0];
        assert_eq!(img.files.len(), 1);
        assert_eq!(img.files[0].path, "docs/img/a.png");
    }

    #[test]
    fn top_level_files_are_surfaced() {
        let preview = build_tree(vec![
            (false, "top.txt".to_string(), 5),
            (true, "docs/".to_string(), 0),
        ]);
        assert_eq!(preview.files.len(), 1);
        assert_eq!(preview.files[0].path, "top.txt");
        assert_eq!(preview.folders.len(), 1);
    }

    #[test]
    fn first_matching_parent_wins() {
        let preview = build_tree(vec![
            (true, "a/".to_string(), 0),
            (true, "a/".to_string(), 0),
            (false, "a/x.txt".to_string(), 1),
        ]);
        assert_eq!(preview.folders.len(), 2);
        assert_eq!(preview.folders[0].files.len(), 1);
        assert!(preview.folders[1].files.is_empty());
    }

    #[test]
    fn empty_input_produces_empty_preview() {
        assert_eq!(build_tree(Vec::new()), Preview::default());
    }
}
