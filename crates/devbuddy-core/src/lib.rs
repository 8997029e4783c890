//! DevBuddy Core - plugin engine and staged scaffold pipeline behind `dbuddy`
//!
//! This library provides the functionality of the `dbuddy` CLI: scaffolding
//! projects across ecosystems, installing framework tooling, formatting and
//! analyzing code, preparing environments and dependencies, and extending the
//! command surface with plugins.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Runtime detection, subprocesses behind the
//!   [`Toolchain`] seam, templates, existence-guarded writes
//! - **Layer 2: Orchestration** - [`PrerequisiteResolver`], the scaffold
//!   [`Pipeline`], the [`PluginLoader`] and [`CapabilityRegistry`]
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts and progress rendering
//! - `testing`: Exposes the scripted `testing::FakeToolchain` for integration tests
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use devbuddy_core::{scaffold, ProjectFlags, ProjectSpec, Settings, SilentProgress, SystemToolchain};
//!
//! let settings = Settings::load(None)?;
//! let spec = ProjectSpec::parse("flask-shop", ProjectFlags { dockerize: true, ..Default::default() })?;
//! let report = scaffold(&spec, "shop".as_ref(), &SystemToolchain::new(false), &SilentProgress, &settings).await?;
//! assert!(report.outcome.success);
//! ```

pub mod analysis;
pub mod config;
pub mod dependencies;
pub mod docs;
pub mod environment;
pub mod error;
pub mod formatter;
pub mod frameworks;
pub mod plugins;
pub mod progress;
pub mod project;
pub mod registry;
pub mod runtime;
pub mod scaffold;
pub mod templates;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::Settings;
pub use plugins::{LoadReport, PluginLoader, PluginManager};
pub use progress::{Progress, SilentProgress};
pub use project::{ProjectFlags, ProjectKind, ProjectSpec};
pub use registry::{Capability, CapabilityRegistry, CommandHandler};
pub use runtime::{PrerequisiteResolver, SystemToolchain, Toolchain};
pub use scaffold::{scaffold, OverallOutcome, Pipeline, ScaffoldReport, Stage, StageResult};
