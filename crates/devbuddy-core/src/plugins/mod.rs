//! Plugin extension engine
//!
//! This module provides:
//! - Discovery of plugin directories
//! - Loading of rhai entry points, each in an isolated engine
//! - Atomic registration of plugin commands into the capability registry
//! - Installing, updating and removing plugins

pub mod discovery;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod script;
pub mod version;

pub use discovery::{discover, PluginDescriptor};
pub use loader::{
    LoadReport, LoadedPlugin, PluginLoader, PluginOutcome, PluginStatus, RegistrationSummary,
};
pub use manager::{PluginManager, PluginSource};
pub use manifest::{PluginManifest, ENTRY_POINT, MANIFEST_FILE};
