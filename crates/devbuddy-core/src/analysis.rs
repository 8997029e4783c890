//! `dbuddy analyze`: static analysis of Python code with pylint

use crate::config::Settings;
use crate::error::{AnalysisError, FormatError, ProcessError};
use crate::formatter::collect_files;
use crate::progress::Progress;
use crate::runtime::{AuxiliaryTool, Installer, Invocation, PrerequisiteResolver, Toolchain};
use std::path::Path;

pub const PYLINT: AuxiliaryTool = AuxiliaryTool::new("pylint", "pylint", Installer::Pip, &["pylint"]);

/// pylint's exit status is a bit mask; this bit means it was misused
const PYLINT_USAGE_ERROR: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub files: usize,
    /// pylint reported at least one message
    pub issues_found: bool,
}

/// Run pylint over `path`, installing it first if needed.
///
/// Only the top level of a directory decides whether there is Python code
/// to analyze; pylint itself descends into packages.
pub async fn analyze_code<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    settings: &Settings,
    path: &Path,
) -> Result<AnalysisSummary, AnalysisError> {
    let files = match collect_files(path, false) {
        Ok(files) => files,
        Err(FormatError::NoFiles(dir)) => return Err(AnalysisError::Unsupported(dir)),
        Err(e) => return Err(AnalysisError::Files(e)),
    };

    PrerequisiteResolver::from_settings(toolchain, progress, settings)
        .ensure_python_tool(&PYLINT)
        .await?;

    tracing::info!(path = %path.display(), files = files.len(), "analyzing");
    let invocation = Invocation::new(PYLINT.program).arg(path.to_string_lossy());
    let issues_found = match toolchain.run(&invocation, settings.command_timeout()).await {
        Ok(()) => false,
        Err(ProcessError::Failed {
            code: Some(code), ..
        }) if code & PYLINT_USAGE_ERROR == 0 => true,
        Err(e) => return Err(e.into()),
    };

    Ok(AnalysisSummary {
        files: files.len(),
        issues_found,
    })
}
