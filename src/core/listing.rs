//! Listing model: the wire shape of `/fsm/filelist` and the derived
//! render-ready view of one folder.
//!
//! Entries are ephemeral — re-fetched on every listing, never cached beyond
//! the current render. The device is known to occasionally return duplicate
//! folder entries, so folders are deduplicated by name (last write wins)
//! before anything is shown.

use serde::Deserialize;
use std::collections::HashMap;

/// One entry of a folder listing as the device reports it.
///
/// `size` is bytes for a file and child count for a directory. `access` is
/// `"r"` for read-only entries; anything else is writable.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "default_access")]
    pub access: String,
}

fn default_access() -> String {
    "w".to_string()
}

impl FileEntry {
    /// Read-only entries always render their delete control disabled
    /// ("Locked"), regardless of any other state.
    pub fn is_read_only(&self) -> bool {
        self.access == "r"
    }
}

/// Successful `/fsm/filelist` response body.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub used_space: u64,
    #[serde(default)]
    pub total_space: u64,
    /// Folder the device believes was listed. Subject to the stale-echo
    /// suppression in [`crate::core::nav::NavState`].
    pub current_folder: Option<String>,
}

/// Render-ready view of one folder: deduplicated, partitioned, sorted.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub folders: Vec<FileEntry>,
    pub files: Vec<FileEntry>,
}

impl Listing {
    /// Build the render order from raw entries.
    ///
    /// Folders are deduplicated by name (last occurrence wins), then each
    /// group is sorted by case-normalized name. The sort is stable, so
    /// entries that differ only in case keep their arrival order.
    pub fn build(entries: &[FileEntry]) -> Self {
        let mut folder_map: HashMap<&str, &FileEntry> = HashMap::new();
        let mut folder_order: Vec<&str> = Vec::new();
        let mut files: Vec<FileEntry> = Vec::new();

        for entry in entries {
            if entry.is_dir {
                if folder_map.insert(entry.name.as_str(), entry).is_none() {
                    folder_order.push(entry.name.as_str());
                }
            } else {
                files.push(entry.clone());
            }
        }

        let mut folders: Vec<FileEntry> = folder_order
            .into_iter()
            .filter_map(|name| folder_map.get(name).copied().cloned())
            .collect();

        folders.sort_by_key(|e| e.name.to_lowercase());
        files.sort_by_key(|e| e.name.to_lowercase());

        Self { folders, files }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    /// Entry at a render position, folders first.
    pub fn get(&self, idx: usize) -> Option<&FileEntry> {
        if idx < self.folders.len() {
            self.folders.get(idx)
        } else {
            self.files.get(idx - self.folders.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_dir: true,
            size: 0,
            access: "w".to_string(),
        }
    }

    fn file(name: &str, size: u64) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_dir: false,
            size,
            access: "w".to_string(),
        }
    }

    #[test]
    fn deserializes_wire_shape() {
        let json = r#"{
            "files": [
                {"name": "logs", "isDir": true, "size": 3, "access": "w"},
                {"name": "boot.cfg", "isDir": false, "size": 120, "access": "r"}
            ],
            "usedSpace": 4096,
            "totalSpace": 1048576,
            "currentFolder": "/"
        }"#;
        let listing: FileListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.files.len(), 2);
        assert!(listing.files[0].is_dir);
        assert!(listing.files[1].is_read_only());
        assert_eq!(listing.current_folder.as_deref(), Some("/"));
    }

    #[test]
    fn missing_access_defaults_to_writable() {
        let entry: FileEntry = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert!(!entry.is_read_only());
    }

    #[test]
    fn duplicate_folders_collapse_to_one() {
        let mut dup = folder("x");
        dup.access = "r".to_string();
        let listing = Listing::build(&[folder("x"), dup]);
        assert_eq!(listing.folders.len(), 1);
        // Last write wins.
        assert!(listing.folders[0].is_read_only());
    }

    #[test]
    fn folders_before_files_each_sorted() {
        let listing = Listing::build(&[
            file("zz.txt", 1),
            folder("beta"),
            file("Alpha.txt", 1),
            folder("alpha"),
        ]);
        let names: Vec<&str> = (0..listing.len())
            .filter_map(|i| listing.get(i).map(|e| e.name.as_str()))
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "Alpha.txt", "zz.txt"]);
    }

    #[test]
    fn sort_is_case_normalized_and_stable() {
        let listing = Listing::build(&[file("b", 0), file("a", 0), file("B", 0)]);
        let names: Vec<&str> = listing.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "B"]);
        // Deterministic across repeated builds on the same input.
        let again = Listing::build(&[file("b", 0), file("a", 0), file("B", 0)]);
        let names_again: Vec<&str> = again.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, names_again);
    }
}
