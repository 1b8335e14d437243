use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Side-effect-free filesystem queries. Errors never escape: an unreadable
/// path does not exist and has size zero.
pub trait FsProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// On-disk size of a file or directory tree.
    fn size_of(&self, path: &Path) -> u64;

    /// Size of several paths measured together; shared blocks (hard links,
    /// nested paths) are counted once.
    fn size_of_many(&self, paths: &[PathBuf]) -> u64;

    /// `(device, inode)` of the object at `path`, symlinks not followed.
    /// Two spellings of one path on a case-insensitive volume share an id.
    fn file_id(&self, path: &Path) -> Option<(u64, u64)>;
}

/// Probe backed by the real filesystem, sizing the way `du` does: allocated
/// blocks rather than byte lengths, each inode once.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskProbe;

impl FsProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        // Dangling symlinks still need removing.
        path.symlink_metadata().is_ok()
    }

    fn size_of(&self, path: &Path) -> u64 {
        let mut seen = HashSet::new();
        tree_size(path, &mut seen)
    }

    fn size_of_many(&self, paths: &[PathBuf]) -> u64 {
        let mut seen = HashSet::new();
        paths.iter().map(|p| tree_size(p, &mut seen)).sum()
    }

    fn file_id(&self, path: &Path) -> Option<(u64, u64)> {
        inode_key(&path.symlink_metadata().ok()?)
    }
}

fn tree_size(root: &Path, seen: &mut HashSet<(u64, u64)>) -> u64 {
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false).into_iter().flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if let Some(key) = inode_key(&meta) {
            if !seen.insert(key) {
                continue;
            }
        }
        total += allocated_bytes(&meta);
    }
    total
}

#[cfg(unix)]
fn inode_key(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn inode_key(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

#[cfg(unix)]
fn allocated_bytes(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks() * 512
}

#[cfg(not(unix))]
fn allocated_bytes(meta: &std::fs::Metadata) -> u64 {
    meta.len()
}
