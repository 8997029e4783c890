//! Plugin discovery
//!
//! Every immediate subdirectory of the plugin root is a candidate. Names
//! starting with `__` or `.` are reserved (caches, VCS metadata) and never
//! considered.

use super::manifest::ENTRY_POINT;
use std::path::{Path, PathBuf};

/// A candidate plugin found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub location: PathBuf,
    /// The entry point exists
    pub loadable: bool,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        Self {
            name: name.into(),
            loadable: location.join(ENTRY_POINT).is_file(),
            location,
        }
    }

    pub fn entry_point(&self) -> PathBuf {
        self.location.join(ENTRY_POINT)
    }
}

pub fn is_reserved(name: &str) -> bool {
    name.starts_with("__") || name.starts_with('.')
}

/// List candidate plugins under `root`, sorted by name.
///
/// A missing or unreadable root yields an empty list.
pub fn discover(root: &Path) -> Vec<PluginDescriptor> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "no plugin directory");
            return Vec::new();
        }
    };

    let mut found: Vec<PluginDescriptor> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            (!is_reserved(&name)).then(|| PluginDescriptor::new(name, entry.path()))
        })
        .collect();

    found.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(root = %root.display(), count = found.len(), "discovered plugins");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovery_is_sorted_and_skips_reserved() {
        let root = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "__pycache__", ".git", "mid"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("alpha").join(ENTRY_POINT), "").unwrap();
        fs::write(root.path().join("README.md"), "not a plugin").unwrap();

        let found = discover(root.path());
        let names: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
        assert!(found[0].loadable);
        assert!(!found[1].loadable);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover(&root.path().join("absent")).is_empty());
    }
}
