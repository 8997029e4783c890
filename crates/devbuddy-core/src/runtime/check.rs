//! Runtime and tool detection for each project kind

use super::process::Toolchain;
use super::tool::{AuxiliaryTool, Installer};
use crate::project::ProjectKind;
use std::fmt;
use std::path::{Path, PathBuf};

/// Result of probing for one executable. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAvailability {
    pub tool: String,
    pub present: bool,
    pub path: Option<PathBuf>,
}

impl ToolAvailability {
    pub fn found(tool: impl Into<String>, path: PathBuf) -> Self {
        Self {
            tool: tool.into(),
            present: true,
            path: Some(path),
        }
    }

    pub fn missing(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            present: false,
            path: None,
        }
    }
}

impl fmt::Display for ToolAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.tool, path.display()),
            None => write!(f, "{} (missing)", self.tool),
        }
    }
}

/// A base runtime. Its absence aborts the scaffold; it is never installed for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Runtime {
    pub name: &'static str,
    /// Executable names tried in order
    pub programs: &'static [&'static str],
    pub download_url: &'static str,
}

pub const PYTHON: Runtime = Runtime {
    name: "Python 3",
    programs: &["python3", "python"],
    download_url: "https://www.python.org/downloads/",
};

pub const NODE: Runtime = Runtime {
    name: "Node.js",
    programs: &["node"],
    download_url: "https://nodejs.org/",
};

pub const NPM: Runtime = Runtime {
    name: "npm",
    programs: &["npm"],
    download_url: "https://nodejs.org/",
};

pub const PHP: Runtime = Runtime {
    name: "PHP",
    programs: &["php"],
    download_url: "https://www.php.net/downloads",
};

pub const COMPOSER: Runtime = Runtime {
    name: "Composer",
    programs: &["composer"],
    download_url: "https://getcomposer.org/download/",
};

pub const JAVA: Runtime = Runtime {
    name: "Java",
    programs: &["java"],
    download_url: "https://adoptium.net/",
};

pub const GO: Runtime = Runtime {
    name: "Go",
    programs: &["go"],
    download_url: "https://go.dev/dl/",
};

pub const CARGO: Runtime = Runtime {
    name: "Cargo",
    programs: &["cargo"],
    download_url: "https://rustup.rs/",
};

pub const DOTNET: Runtime = Runtime {
    name: ".NET SDK",
    programs: &["dotnet"],
    download_url: "https://dotnet.microsoft.com/download",
};

/// What a project kind needs before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub runtimes: &'static [Runtime],
    pub auxiliary: Option<AuxiliaryTool>,
}

pub fn requirements_for(kind: ProjectKind) -> Requirements {
    const PY: &[Runtime] = &[PYTHON];
    const JS: &[Runtime] = &[NODE, NPM];

    let (runtimes, auxiliary): (&'static [Runtime], _) = match kind {
        ProjectKind::Python => (PY, None),
        ProjectKind::Flask => (
            PY,
            Some(AuxiliaryTool::new("Flask", "flask", Installer::Pip, &["flask"])),
        ),
        ProjectKind::Django => (
            PY,
            Some(AuxiliaryTool::new(
                "Django",
                "django-admin",
                Installer::Pip,
                &["django"],
            )),
        ),
        ProjectKind::FastApi => (
            PY,
            Some(AuxiliaryTool::new(
                "FastAPI",
                "uvicorn",
                Installer::Pip,
                &["fastapi", "uvicorn"],
            )),
        ),
        ProjectKind::React | ProjectKind::Next | ProjectKind::Express => (JS, None),
        ProjectKind::Vue => (
            JS,
            Some(AuxiliaryTool::new(
                "Vue CLI",
                "vue",
                Installer::NpmGlobal,
                &["@vue/cli"],
            )),
        ),
        ProjectKind::Angular => (
            JS,
            Some(AuxiliaryTool::new(
                "Angular CLI",
                "ng",
                Installer::NpmGlobal,
                &["@angular/cli"],
            )),
        ),
        ProjectKind::Laravel => (&[PHP, COMPOSER], None),
        ProjectKind::Spring => (&[JAVA], None),
        ProjectKind::Go => (&[GO], None),
        ProjectKind::Rust => (&[CARGO], None),
        ProjectKind::DotNet => (&[DOTNET], None),
    };

    Requirements {
        runtimes,
        auxiliary,
    }
}

/// An executable inside a virtual environment rooted at `venv`
pub fn venv_executable(venv: &Path, name: &str) -> PathBuf {
    let bin = if cfg!(windows) { "Scripts" } else { "bin" };
    venv.join(bin).join(name)
}

/// Locate a runtime, trying each of its executable names
pub fn check_runtime<T: Toolchain>(toolchain: &T, runtime: &Runtime) -> ToolAvailability {
    runtime
        .programs
        .iter()
        .find_map(|program| {
            toolchain
                .locate(program)
                .map(|path| ToolAvailability::found(*program, path))
        })
        .unwrap_or_else(|| ToolAvailability::missing(runtime.programs.join("|")))
}

/// Locate a single executable
pub fn check_tool<T: Toolchain>(toolchain: &T, program: &str) -> ToolAvailability {
    match toolchain.locate(program) {
        Some(path) => ToolAvailability::found(program, path),
        None => ToolAvailability::missing(program),
    }
}
