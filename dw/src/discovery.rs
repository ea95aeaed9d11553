//! Source discovery
//!
//! Supplies the relative paths under a source root that become template
//! names. Traversal is either flat or recursive, chosen explicitly, and
//! entries come back sorted by name so compilation order is stable.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CompileError, Result};

/// One entry found under a source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    /// Path relative to the root, `/`-separated
    pub relative_path: String,
    pub is_dir: bool,
}

/// Something that can list the entries under a root
pub trait Discovery {
    fn discover(&self, root: &Path) -> Result<Vec<DiscoveredEntry>>;
}

/// Whether traversal descends into subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPolicy {
    Flat,
    Recursive,
}

/// Filesystem discovery backed by walkdir
#[derive(Debug, Clone)]
pub struct WalkDiscovery {
    policy: DiscoveryPolicy,
}

impl WalkDiscovery {
    pub fn new(policy: DiscoveryPolicy) -> Self {
        Self { policy }
    }
}

impl Discovery for WalkDiscovery {
    fn discover(&self, root: &Path) -> Result<Vec<DiscoveredEntry>> {
        debug!(?root, policy = ?self.policy, "WalkDiscovery::discover: called");
        let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        if self.policy == DiscoveryPolicy::Flat {
            walker = walker.max_depth(1);
        }

        let mut entries = Vec::new();
        let iter = walker.into_iter().filter_entry(|e| !is_hidden(e.file_name()));
        for entry in iter {
            let entry = entry.map_err(|e| CompileError::Discovery {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            entries.push(DiscoveredEntry {
                relative_path: to_template_name(relative),
                is_dir: entry.file_type().is_dir(),
            });
        }

        debug!(count = entries.len(), "WalkDiscovery::discover: done");
        Ok(entries)
    }
}

/// Relative paths of every non-directory entry
pub fn source_files(discovery: &dyn Discovery, root: &Path) -> Result<Vec<String>> {
    Ok(discovery
        .discover(root)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.relative_path)
        .collect())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

fn to_template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a document path into its source root and root template name
pub fn split_document(path: &Path) -> (PathBuf, String) {
    let root = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (root, name)
}
