//! Runtime detection, tool installation and subprocess execution
//!
//! This module provides:
//! - The [`Toolchain`] seam over PATH lookup and subprocesses
//! - Per-kind runtime and framework CLI requirements
//! - The [`PrerequisiteResolver`], run before any scaffold write

pub mod check;
pub mod process;
pub mod resolver;
pub mod tool;

pub use check::{
    check_runtime, check_tool, requirements_for, venv_executable, Requirements, Runtime,
    ToolAvailability,
};
pub use process::{Invocation, SystemToolchain, Toolchain};
pub use resolver::{PrerequisiteResolver, Prerequisites};
pub use tool::{AuxiliaryTool, Installer};
