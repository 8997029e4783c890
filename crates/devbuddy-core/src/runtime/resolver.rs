//! Prerequisite resolution before a scaffold
//!
//! Base runtimes are strict: if one is missing the scaffold is refused and
//! nothing is written. Framework CLIs are auxiliary: when missing they may be
//! installed, after the user has been told that their global environment is
//! about to change.

use super::check::{check_runtime, check_tool, requirements_for, ToolAvailability, PYTHON};
use super::process::Toolchain;
use super::tool::AuxiliaryTool;
use crate::config::Settings;
use crate::error::PrerequisiteError;
use crate::progress::Progress;
use crate::project::ProjectKind;
use std::time::Duration;

/// Interpreter used when no Python runtime was resolved
pub const DEFAULT_PYTHON: &str = "python3";

/// Everything the resolver found, in check order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prerequisites {
    pub tools: Vec<ToolAvailability>,
    python: Option<String>,
}

impl Prerequisites {
    /// The Python executable that was found (`python3` or `python`)
    pub fn python(&self) -> &str {
        self.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    pub fn with_python(mut self, program: impl Into<String>) -> Self {
        self.python = Some(program.into());
        self
    }
}

pub struct PrerequisiteResolver<'a, T, P> {
    toolchain: &'a T,
    progress: &'a P,
    auto_install: bool,
    install_timeout: Duration,
}

impl<'a, T: Toolchain, P: Progress> PrerequisiteResolver<'a, T, P> {
    pub fn new(toolchain: &'a T, progress: &'a P) -> Self {
        let defaults = Settings::default();
        Self {
            toolchain,
            progress,
            auto_install: defaults.auto_install,
            install_timeout: defaults.install_timeout(),
        }
    }

    pub fn from_settings(toolchain: &'a T, progress: &'a P, settings: &Settings) -> Self {
        Self {
            toolchain,
            progress,
            auto_install: settings.auto_install,
            install_timeout: settings.install_timeout(),
        }
    }

    pub fn auto_install(mut self, enabled: bool) -> Self {
        self.auto_install = enabled;
        self
    }

    pub fn install_timeout(mut self, limit: Duration) -> Self {
        self.install_timeout = limit;
        self
    }

    /// Verify (and possibly install) everything `kind` needs.
    ///
    /// All base runtimes are checked before any install is attempted, so a
    /// missing runtime never leaves a half-changed environment behind.
    pub async fn ensure(&self, kind: ProjectKind) -> Result<Prerequisites, PrerequisiteError> {
        let requirements = requirements_for(kind);
        let mut prerequisites = Prerequisites::default();

        for runtime in requirements.runtimes {
            let found = check_runtime(self.toolchain, runtime);
            tracing::debug!(kind = %kind, tool = %found, "runtime check");
            if !found.present {
                return Err(PrerequisiteError::MissingRuntime {
                    runtime: runtime.name,
                    download_url: runtime.download_url,
                });
            }
            if runtime == &PYTHON {
                prerequisites.python = Some(found.tool.clone());
            }
            prerequisites.tools.push(found);
        }

        if let Some(tool) = requirements.auxiliary {
            let found = self.ensure_tool(&tool, prerequisites.python()).await?;
            prerequisites.tools.push(found);
        }

        Ok(prerequisites)
    }

    /// Make sure an auxiliary tool is on PATH, installing it if allowed
    pub async fn ensure_tool(
        &self,
        tool: &AuxiliaryTool,
        python: &str,
    ) -> Result<ToolAvailability, PrerequisiteError> {
        let found = check_tool(self.toolchain, tool.program);
        if found.present {
            tracing::debug!(tool = %found, "auxiliary tool present");
            return Ok(found);
        }

        let install = tool.install_command(python);
        if !self.auto_install {
            return Err(PrerequisiteError::AuxiliaryMissing {
                tool: tool.name,
                install,
            });
        }

        self.progress.warn(&format!(
            "{} is not installed. Running `{}` (this changes your global {} environment)",
            tool.name, install, tool.installer
        ));
        self.progress.start(&format!("Installing {}...", tool.name));

        if let Err(source) = tool
            .install(self.toolchain, python, self.install_timeout)
            .await
        {
            self.progress.stop(&format!("Installing {} failed", tool.name));
            return Err(PrerequisiteError::AuxiliaryInstallFailed {
                tool: tool.name,
                source,
            });
        }

        let found = check_tool(self.toolchain, tool.program);
        if !found.present {
            self.progress
                .stop(&format!("{} installed but not on PATH", tool.name));
            return Err(PrerequisiteError::AuxiliaryStillMissing {
                tool: tool.name,
                install,
            });
        }

        self.progress.stop(&format!("{} installed", tool.name));
        tracing::info!(tool = %found, "auxiliary tool installed");
        Ok(found)
    }

    /// [`ensure_tool`](Self::ensure_tool) for a pip-installed tool. Python is
    /// only required when the tool is missing.
    pub async fn ensure_python_tool(
        &self,
        tool: &AuxiliaryTool,
    ) -> Result<ToolAvailability, PrerequisiteError> {
        let found = check_tool(self.toolchain, tool.program);
        if found.present {
            return Ok(found);
        }
        let python = check_runtime(self.toolchain, &PYTHON);
        if !python.present {
            return Err(PrerequisiteError::MissingRuntime {
                runtime: PYTHON.name,
                download_url: PYTHON.download_url,
            });
        }
        self.ensure_tool(tool, &python.tool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use crate::runtime::Installer;
    use crate::testing::{FakeToolchain, Journal, RecordingProgress};

    #[tokio::test]
    async fn test_missing_runtime_names_download_url() {
        let toolchain = FakeToolchain::new().with_tools(["npm"]);
        let resolver = PrerequisiteResolver::new(&toolchain, &SilentProgress);

        let err = resolver.ensure(ProjectKind::React).await.unwrap_err();
        match err {
            PrerequisiteError::MissingRuntime {
                runtime,
                download_url,
            } => {
                assert_eq!(runtime, "Node.js");
                assert_eq!(download_url, "https://nodejs.org/");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(toolchain.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_missing_runtime_blocks_auxiliary_install() {
        let toolchain = FakeToolchain::new()
            .with_tools(["node"])
            .installs("npm", "vue");
        let resolver = PrerequisiteResolver::new(&toolchain, &SilentProgress);

        assert!(resolver.ensure(ProjectKind::Vue).await.is_err());
        assert!(toolchain.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_present_tools_are_reported_in_order() {
        let toolchain = FakeToolchain::new().with_tools(["python", "flask"]);
        let resolver = PrerequisiteResolver::new(&toolchain, &SilentProgress);

        let found = resolver.ensure(ProjectKind::Flask).await.unwrap();
        let names: Vec<_> = found.tools.iter().map(|t| t.tool.as_str()).collect();
        assert_eq!(names, ["python", "flask"]);
        assert_eq!(found.python(), "python");
    }

    #[tokio::test]
    async fn test_auxiliary_is_installed_after_announcement() {
        let journal = Journal::default();
        let toolchain = FakeToolchain::new()
            .with_tools(["python3"])
            .installs("python3", "django-admin")
            .with_journal(journal.clone());
        let progress = RecordingProgress::with_journal(journal.clone());
        let resolver = PrerequisiteResolver::new(&toolchain, &progress);

        let found = resolver.ensure(ProjectKind::Django).await.unwrap();
        assert!(found.tools.iter().all(|t| t.present));

        let entries = journal.entries();
        let warn = entries
            .iter()
            .position(|e| e.starts_with("warn:"))
            .expect("install must be announced");
        let run = entries
            .iter()
            .position(|e| e == "run: python3 -m pip install django")
            .expect("installer must run");
        assert!(warn < run);
    }

    #[tokio::test]
    async fn test_auto_install_disabled_reports_missing() {
        let toolchain = FakeToolchain::new().with_tools(["node", "npm"]);
        let resolver =
            PrerequisiteResolver::new(&toolchain, &SilentProgress).auto_install(false);

        let err = resolver.ensure(ProjectKind::Angular).await.unwrap_err();
        assert!(matches!(err, PrerequisiteError::AuxiliaryMissing { tool: "Angular CLI", .. }));
        assert!(toolchain.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_install_is_distinct_from_missing() {
        let toolchain = FakeToolchain::new()
            .with_tools(["node", "npm"])
            .failing("npm");
        let resolver = PrerequisiteResolver::new(&toolchain, &SilentProgress);

        let err = resolver.ensure(ProjectKind::Vue).await.unwrap_err();
        assert!(matches!(err, PrerequisiteError::AuxiliaryInstallFailed { .. }));
    }

    #[tokio::test]
    async fn test_install_that_leaves_tool_off_path() {
        // installer exits 0 but provides nothing
        let toolchain = FakeToolchain::new().with_tools(["node", "npm"]);
        let resolver = PrerequisiteResolver::new(&toolchain, &SilentProgress);

        let err = resolver.ensure(ProjectKind::Vue).await.unwrap_err();
        assert!(matches!(err, PrerequisiteError::AuxiliaryStillMissing { .. }));
    }

    #[tokio::test]
    async fn test_python_tool_needs_python_only_when_missing() {
        let pylint = AuxiliaryTool::new("pylint", "pylint", Installer::Pip, &["pylint"]);

        let present = FakeToolchain::new().with_tools(["pylint"]);
        let found = PrerequisiteResolver::new(&present, &SilentProgress)
            .ensure_python_tool(&pylint)
            .await
            .unwrap();
        assert!(found.present);

        let bare = FakeToolchain::new();
        let err = PrerequisiteResolver::new(&bare, &SilentProgress)
            .ensure_python_tool(&pylint)
            .await
            .unwrap_err();
        assert!(matches!(err, PrerequisiteError::MissingRuntime { runtime: "Python 3", .. }));
        assert!(bare.commands().is_empty());
    }
}
