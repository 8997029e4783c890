//! `dbuddy setup-env`: prepare an existing directory for development
//!
//! Every step that produces something is guarded by the path it produces,
//! so running the command again only does what is still missing. Dependency
//! installs run when their manifest is present.

use crate::config::Settings;
use crate::error::{EnvironmentError, PrerequisiteError};
use crate::progress::Progress;
use crate::runtime::check::{check_runtime, Runtime, COMPOSER, NODE, NPM, PHP, PYTHON};
use crate::runtime::{venv_executable, Invocation, Toolchain};
use crate::scaffold::{Artifact, ArtifactWriter};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const VENV: &str = "venv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    Python,
    Node,
    Laravel,
    React,
    Vue,
    Django,
}

impl EnvKind {
    pub const ALL: [EnvKind; 6] = [
        EnvKind::Python,
        EnvKind::Node,
        EnvKind::Laravel,
        EnvKind::React,
        EnvKind::Vue,
        EnvKind::Django,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKind::Python => "python",
            EnvKind::Node => "node",
            EnvKind::Laravel => "laravel",
            EnvKind::React => "react",
            EnvKind::Vue => "vue",
            EnvKind::Django => "django",
        }
    }

    pub fn runtimes(&self) -> &'static [Runtime] {
        match self {
            EnvKind::Python | EnvKind::Django => &[PYTHON],
            EnvKind::Node | EnvKind::React | EnvKind::Vue => &[NODE, NPM],
            EnvKind::Laravel => &[PHP, COMPOSER],
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvKind {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EnvironmentError::UnknownKind(s.to_string()))
    }
}

/// What `dbuddy setup-env` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRequest {
    pub kind: EnvKind,
    pub path: PathBuf,
    pub install_deps: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSetup {
    /// Paths the steps produced or found already present
    pub artifacts: Vec<Artifact>,
    /// Dependency installs that ran
    pub installs: Vec<String>,
    /// Shown to the user afterwards, e.g. how to activate the venv
    pub next_steps: Vec<String>,
}

/// One command of a setup
struct Step {
    label: String,
    invocation: Invocation,
    /// Skipped when this exists; must exist afterwards
    creates: Option<PathBuf>,
    /// Only runs when this exists
    requires: Option<PathBuf>,
}

impl Step {
    fn creates(label: impl Into<String>, invocation: Invocation, marker: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            invocation,
            creates: Some(marker.into()),
            requires: None,
        }
    }

    fn install(label: impl Into<String>, invocation: Invocation, manifest: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            invocation,
            creates: None,
            requires: Some(manifest.into()),
        }
    }
}

fn venv_steps(dir: &Path, python: &str, install_deps: bool) -> Vec<Step> {
    let pip = venv_executable(&dir.join(VENV), "pip");
    let mut steps = vec![Step::creates(
        "Creating virtual environment",
        Invocation::new(python).args(["-m", "venv", VENV]),
        VENV,
    )];
    if install_deps {
        steps.push(Step::install(
            "Installing requirements.txt",
            Invocation::new(pip.to_string_lossy()).args(["install", "-r", "requirements.txt"]),
            "requirements.txt",
        ));
    }
    steps
}

fn steps(request: &EnvRequest, python: &str) -> Vec<Step> {
    let dir = request.path.as_path();
    let npm_install = || {
        Step::install(
            "Installing npm dependencies",
            Invocation::new("npm").arg("install"),
            "package.json",
        )
    };

    let mut steps = match request.kind {
        EnvKind::Python => venv_steps(dir, python, request.install_deps),
        EnvKind::Django => {
            let venv = dir.join(VENV);
            let mut steps = venv_steps(dir, python, request.install_deps);
            steps.push(Step::creates(
                "Installing Django into the virtual environment",
                Invocation::new(venv_executable(&venv, "pip").to_string_lossy())
                    .args(["install", "django"]),
                venv_executable(Path::new(VENV), "django-admin"),
            ));
            steps.push(Step::creates(
                "Creating Django project",
                Invocation::new(venv_executable(&venv, "django-admin").to_string_lossy())
                    .args(["startproject", "config", "."]),
                "manage.py",
            ));
            return steps;
        }
        EnvKind::Node => vec![Step::creates(
            "Initializing package.json",
            Invocation::new("npm").args(["init", "-y"]),
            "package.json",
        )],
        EnvKind::React => vec![Step::creates(
            "Creating React app",
            Invocation::new("npx").args(["create-react-app", "."]),
            "package.json",
        )],
        EnvKind::Vue => vec![Step::creates(
            "Creating Vue app",
            Invocation::new("npx").args(["@vue/cli", "create", ".", "--default"]),
            "package.json",
        )],
        EnvKind::Laravel => {
            let mut steps = vec![Step::creates(
                "Creating Laravel project",
                Invocation::new("composer").args([
                    "create-project",
                    "--prefer-dist",
                    "laravel/laravel",
                    ".",
                ]),
                "composer.json",
            )];
            if request.install_deps {
                steps.push(Step::install(
                    "Installing composer dependencies",
                    Invocation::new("composer").arg("install"),
                    "composer.json",
                ));
            }
            return steps;
        }
    };
    if request.install_deps && matches!(request.kind, EnvKind::Node | EnvKind::React | EnvKind::Vue)
    {
        steps.push(npm_install());
    }
    steps
}

fn activation_hint() -> String {
    let activate = venv_executable(Path::new(VENV), "activate");
    if cfg!(windows) {
        activate.display().to_string()
    } else {
        format!("source {}", activate.display())
    }
}

/// Run the setup for `request.kind` inside `request.path`
pub async fn setup_env<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    settings: &Settings,
    request: &EnvRequest,
) -> Result<EnvSetup, EnvironmentError> {
    if !request.path.is_dir() {
        return Err(EnvironmentError::MissingPath(request.path.clone()));
    }

    let mut python = None;
    for runtime in request.kind.runtimes() {
        let found = check_runtime(toolchain, runtime);
        if !found.present {
            return Err(PrerequisiteError::MissingRuntime {
                runtime: runtime.name,
                download_url: runtime.download_url,
            }
            .into());
        }
        if runtime == &PYTHON {
            python = Some(found.tool);
        }
    }
    let python = python.as_deref().unwrap_or(crate::runtime::resolver::DEFAULT_PYTHON);

    let mut writer = ArtifactWriter::new(&request.path);
    let mut setup = EnvSetup::default();
    for step in steps(request, python) {
        if let Some(marker) = &step.creates {
            if writer.exists(marker) {
                tracing::debug!(marker = %marker.display(), "already set up");
                writer.record(Artifact::skipped(marker));
                continue;
            }
        }
        if let Some(manifest) = &step.requires {
            if !writer.exists(manifest) {
                tracing::debug!(manifest = %manifest.display(), "nothing to install");
                continue;
            }
        }

        let invocation = step.invocation.current_dir(&request.path);
        progress.start(&format!("{}...", step.label));
        if let Err(e) = toolchain.run(&invocation, settings.install_timeout()).await {
            progress.stop(&format!("{} failed", step.label));
            return Err(e.into());
        }
        progress.stop(&step.label);

        match step.creates {
            Some(marker) if !writer.exists(&marker) => {
                return Err(EnvironmentError::NothingCreated {
                    command: invocation.to_string(),
                    marker,
                });
            }
            Some(marker) => writer.record(Artifact::created(marker)),
            None => setup.installs.push(invocation.to_string()),
        }
    }

    if matches!(request.kind, EnvKind::Python | EnvKind::Django) {
        setup.next_steps.push(activation_hint());
    }
    if request.kind == EnvKind::Django {
        setup.next_steps.push("python manage.py runserver".to_string());
    }
    tracing::info!(kind = %request.kind, path = %request.path.display(), "environment ready");
    setup.artifacts = writer.into_artifacts();
    Ok(setup)
}
