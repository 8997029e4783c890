//! Plugin manifest types and parsing

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script evaluated when a plugin is loaded
pub const ENTRY_POINT: &str = "plugin.rhai";

/// Optional metadata next to the entry point
pub const MANIFEST_FILE: &str = "plugin.yaml";

/// Plugin manifest (`<plugin>/plugin.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Display name; the directory name stays the plugin's identity
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Plugin's own version, shown by `plugin list`
    #[serde(default)]
    pub version: Option<String>,

    /// Semver requirement on the devbuddy version, e.g. `>=0.2, <0.3`
    #[serde(default)]
    pub requires: Option<String>,
}

impl PluginManifest {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Read `plugin.yaml` from a plugin directory; `None` when there is none
    pub fn read(plugin_dir: &Path) -> Result<Option<Self>, LoadError> {
        let path = plugin_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml(&content)
            .map(Some)
            .map_err(|source| LoadError::Manifest { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_are_optional() {
        let manifest = PluginManifest::from_yaml("description: Handy tools\n").unwrap();
        assert_eq!(manifest.description.as_deref(), Some("Handy tools"));
        assert!(manifest.requires.is_none());
        assert_eq!(PluginManifest::from_yaml("").unwrap(), PluginManifest::default());
    }

    #[test]
    fn test_read_reports_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "requires: [unclosed\n").unwrap();
        let err = PluginManifest::read(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest { .. }));
    }

    #[test]
    fn test_read_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PluginManifest::read(dir.path()).unwrap().is_none());
    }
}
