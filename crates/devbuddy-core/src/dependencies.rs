//! `dbuddy update-deps`: report and upgrade a project's dependencies

use crate::config::Settings;
use crate::error::{DependencyError, PrerequisiteError, ProcessError};
use crate::progress::Progress;
use crate::runtime::check::{check_runtime, Runtime, COMPOSER, NPM, PYTHON};
use crate::runtime::{venv_executable, Invocation, Toolchain};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pip,
    Npm,
    Composer,
}

impl PackageManager {
    /// Detection order when no manager is given
    pub const ALL: [PackageManager; 3] = [
        PackageManager::Pip,
        PackageManager::Npm,
        PackageManager::Composer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Pip => "pip",
            PackageManager::Npm => "npm",
            PackageManager::Composer => "composer",
        }
    }

    pub fn manifest(&self) -> &'static str {
        match self {
            PackageManager::Pip => "requirements.txt",
            PackageManager::Npm => "package.json",
            PackageManager::Composer => "composer.json",
        }
    }

    fn runtime(&self) -> &'static Runtime {
        match self {
            PackageManager::Pip => &PYTHON,
            PackageManager::Npm => &NPM,
            PackageManager::Composer => &COMPOSER,
        }
    }

    /// The first manager whose manifest is in `dir`
    pub fn detect(dir: &Path) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| dir.join(m.manifest()).is_file())
    }

    /// Lists installed, or only outdated, packages
    pub fn report(&self, only_outdated: bool, python: &str) -> Invocation {
        match (self, only_outdated) {
            (PackageManager::Pip, true) => {
                Invocation::new(python).args(["-m", "pip", "list", "--outdated"])
            }
            (PackageManager::Pip, false) => Invocation::new(python).args(["-m", "pip", "list"]),
            (PackageManager::Npm, true) => Invocation::new("npm").arg("outdated"),
            (PackageManager::Npm, false) => Invocation::new("npm").args(["list", "--depth=0"]),
            (PackageManager::Composer, true) => Invocation::new("composer").arg("outdated"),
            (PackageManager::Composer, false) => {
                Invocation::new("composer").args(["show", "--installed"])
            }
        }
    }

    pub fn upgrade(&self, python: &str) -> Invocation {
        match self {
            PackageManager::Pip => Invocation::new(python).args([
                "-m",
                "pip",
                "install",
                "--upgrade",
                "-r",
                "requirements.txt",
            ]),
            PackageManager::Npm => Invocation::new("npm").arg("update"),
            PackageManager::Composer => Invocation::new("composer").arg("update"),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DependencyError::UnknownManager(s.to_string()))
    }
}

/// What `dbuddy update-deps` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
    pub path: PathBuf,
    /// Detected from the manifests in `path` when `None`
    pub manager: Option<PackageManager>,
    pub only_outdated: bool,
}

/// A resolved manager with the commands to run for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPlan {
    pub manager: PackageManager,
    pub report: Invocation,
    pub upgrade: Invocation,
}

/// Pick the manager and interpreter. A project `venv` takes precedence over
/// the system Python.
pub fn plan<T: Toolchain>(
    toolchain: &T,
    request: &DependencyRequest,
) -> Result<DependencyPlan, DependencyError> {
    let dir = request.path.as_path();
    if !dir.is_dir() {
        return Err(DependencyError::MissingPath(request.path.clone()));
    }
    let manager = match request.manager {
        Some(manager) => manager,
        None => PackageManager::detect(dir)
            .ok_or_else(|| DependencyError::NoManifest(request.path.clone()))?,
    };

    let venv_python = venv_executable(&dir.join("venv"), "python")
        .to_string_lossy()
        .into_owned();
    let python = if manager == PackageManager::Pip && toolchain.is_available(&venv_python) {
        venv_python
    } else {
        let runtime = manager.runtime();
        let found = check_runtime(toolchain, runtime);
        if !found.present {
            return Err(PrerequisiteError::MissingRuntime {
                runtime: runtime.name,
                download_url: runtime.download_url,
            }
            .into());
        }
        found.tool
    };

    Ok(DependencyPlan {
        manager,
        report: manager
            .report(request.only_outdated, &python)
            .current_dir(dir),
        upgrade: manager.upgrade(&python).current_dir(dir),
    })
}

/// Print the dependency report. `npm outdated` exits 1 when it lists
/// anything, which is not a failure here.
pub async fn report_dependencies<T: Toolchain>(
    toolchain: &T,
    settings: &Settings,
    plan: &DependencyPlan,
) -> Result<(), DependencyError> {
    match toolchain.run(&plan.report, settings.command_timeout()).await {
        Err(ProcessError::Failed { code: Some(1), .. }) if plan.manager == PackageManager::Npm => {
            Ok(())
        }
        result => Ok(result?),
    }
}

pub async fn upgrade_dependencies<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    settings: &Settings,
    plan: &DependencyPlan,
) -> Result<(), DependencyError> {
    progress.start(&format!("Upgrading {} dependencies...", plan.manager));
    let result = toolchain.run(&plan.upgrade, settings.install_timeout()).await;
    match &result {
        Ok(()) => progress.stop(&format!("{} dependencies upgraded", plan.manager)),
        Err(_) => progress.stop(&format!("Upgrading {} dependencies failed", plan.manager)),
    }
    result?;
    tracing::info!(manager = %plan.manager, "dependencies upgraded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeToolchain, RecordingProgress};

    fn request(path: &Path, manager: Option<PackageManager>, only_outdated: bool) -> DependencyRequest {
        DependencyRequest {
            path: path.to_path_buf(),
            manager,
            only_outdated,
        }
    }

    #[test]
    fn test_detection_order() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(PackageManager::detect(dir.path()), None);

        std::fs::write(dir.path().join("composer.json"), "{}").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), Some(PackageManager::Composer));
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), Some(PackageManager::Npm));
        std::fs::write(dir.path().join("requirements.txt"), "").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), Some(PackageManager::Pip));
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            PackageManager::Pip.report(true, "python3").to_string(),
            "python3 -m pip list --outdated"
        );
        assert_eq!(
            PackageManager::Npm.report(false, "python3").to_string(),
            "npm list --depth=0"
        );
        assert_eq!(
            PackageManager::Composer.report(false, "python3").to_string(),
            "composer show --installed"
        );
        assert_eq!(
            PackageManager::Pip.upgrade("python").to_string(),
            "python -m pip install --upgrade -r requirements.txt"
        );
    }

    #[test]
    fn test_missing_manifest_asks_for_a_manager() {
        let dir = tempfile::tempdir().unwrap();
        let err = plan(&FakeToolchain::new(), &request(dir.path(), None, false)).unwrap_err();
        assert!(matches!(err, DependencyError::NoManifest(_)));
    }

    #[test]
    fn test_pip_prefers_the_project_venv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "").unwrap();
        let venv_python = venv_executable(&dir.path().join("venv"), "python");
        let toolchain = FakeToolchain::new()
            .with_tools(["python3".to_string(), venv_python.to_string_lossy().into_owned()]);

        let plan = plan(&toolchain, &request(dir.path(), None, true)).unwrap();
        assert_eq!(plan.manager, PackageManager::Pip);
        assert_eq!(plan.upgrade.program(), venv_python.to_string_lossy());
        assert_eq!(plan.upgrade.cwd(), Some(dir.path()));

        let global = plan_without_venv(dir.path());
        assert_eq!(global.report.program(), "python3");
    }

    fn plan_without_venv(dir: &Path) -> DependencyPlan {
        plan(
            &FakeToolchain::new().with_tools(["python3"]),
            &request(dir, Some(PackageManager::Pip), true),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_npm_outdated_exit_status_is_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let toolchain = FakeToolchain::new()
            .with_tools(["npm"])
            .failing("npm outdated");
        let settings = Settings::default();

        let plan = plan(&toolchain, &request(dir.path(), None, true)).unwrap();
        report_dependencies(&toolchain, &settings, &plan).await.unwrap();

        let progress = RecordingProgress::new();
        upgrade_dependencies(&toolchain, &progress, &settings, &plan)
            .await
            .unwrap();
        assert_eq!(toolchain.commands(), ["npm outdated", "npm update"]);
        assert_eq!(progress.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_upgrade_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("composer.json"), "{}").unwrap();
        let toolchain = FakeToolchain::new()
            .with_tools(["composer"])
            .failing("composer update");

        let plan = plan(&toolchain, &request(dir.path(), None, false)).unwrap();
        let err = upgrade_dependencies(&toolchain, &RecordingProgress::new(), &Settings::default(), &plan)
            .await
            .unwrap_err();
        assert!(matches!(err, DependencyError::Process(ProcessError::Failed { .. })));
    }
}
