//! CLI prompts and progress using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

mod create;
mod progress;
mod report;

pub use create::{run, CreateArgs};
pub use progress::ClackProgress;
pub use report::{print_plugin_report, print_stage_results};
