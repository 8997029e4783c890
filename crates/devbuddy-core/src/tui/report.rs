//! Result listings for scaffold runs and plugin loading

use crate::plugins::{LoadReport, PluginStatus};
use crate::scaffold::{ScaffoldReport, StageOutcome};
use anyhow::Result;

/// One log line per stage that ran, then the verdict
pub fn print_stage_results(report: &ScaffoldReport) -> Result<()> {
    for result in &report.results {
        let line = format!("{}: {}", result.stage, result.detail);
        match result.outcome {
            StageOutcome::Completed => cliclack::log::success(line)?,
            StageOutcome::Skipped => cliclack::log::remark(line)?,
            StageOutcome::Failed => cliclack::log::error(line)?,
        }
    }

    let outcome = &report.outcome;
    if !outcome.success {
        let cleanup = if outcome.changes_made {
            format!(
                "Files were already written to {}; remove them or re-run once the problem is fixed.",
                report.project_dir.display()
            )
        } else {
            "No files were written.".to_string()
        };
        cliclack::log::error(format!("Scaffold failed. {}", cleanup))?;
    } else if !outcome.failed_stages.is_empty() {
        cliclack::log::warning(format!(
            "Project created, but these optional steps failed: {}",
            outcome.failed_stages.join(", ")
        ))?;
    }
    Ok(())
}

/// Plugin table for `dbuddy plugin list`
pub fn print_plugin_report(report: &LoadReport) -> Result<()> {
    if report.outcomes.is_empty() {
        cliclack::log::info("No plugins installed")?;
        return Ok(());
    }

    for outcome in &report.outcomes {
        let version = outcome
            .manifest
            .as_ref()
            .and_then(|m| m.version.as_deref())
            .map(|v| format!(" v{}", v))
            .unwrap_or_default();
        let line = format!("{}{}: {}", outcome.name, version, outcome.status);
        match &outcome.status {
            PluginStatus::Registered { .. } => cliclack::log::success(line)?,
            PluginStatus::NotLoadable => cliclack::log::remark(line)?,
            PluginStatus::LoadFailed(_) | PluginStatus::RegistrationFailed(_) => {
                cliclack::log::warning(line)?
            }
        }
    }
    Ok(())
}
