//! Error types for devbuddy-core.
//!
//! Failures that must stay isolated (a single plugin, an optional scaffold
//! stage) have their own types so callers can turn them into result records
//! instead of aborting. Failures that abort an operation (missing runtimes,
//! invalid input) propagate through `?`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A capability name was registered twice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("command `{name}` is already registered by {owner}")]
pub struct DuplicateCapability {
    pub name: String,
    pub owner: String,
}

/// Invalid `create` input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectSpecError {
    #[error("expected <type>-<name>, e.g. flask-app (got `{0}`)")]
    MissingSeparator(String),

    #[error("unsupported project type `{kind}`. Supported types: {supported}")]
    UnknownKind { kind: String, supported: String },

    #[error("invalid project name `{0}`: use letters, digits, `-`, `_` or `.`")]
    InvalidName(String),
}

/// A subprocess could not be run to completion.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("`{program}` was not found on PATH")]
    NotFound { program: String },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {secs}s and was killed")]
    TimedOut { command: String, secs: u64 },

    #[error("`{command}` exited with {}", exit_label(.code))]
    Failed { command: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Prerequisite resolution failed; the scaffold is aborted before any write.
#[derive(Debug, Error)]
pub enum PrerequisiteError {
    #[error("{runtime} is not installed. Download it from: {download_url}")]
    MissingRuntime {
        runtime: &'static str,
        download_url: &'static str,
    },

    #[error("{tool} is not installed and automatic installation is disabled. Install it with: {install}")]
    AuxiliaryMissing { tool: &'static str, install: String },

    #[error("{tool} was missing and installing it failed: {source}")]
    AuxiliaryInstallFailed {
        tool: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("{tool} was installed with `{install}` but is still not on PATH")]
    AuxiliaryStillMissing { tool: &'static str, install: String },
}

/// A plugin could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no entry point at {}", .path.display())]
    MissingEntryPoint { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("requires devbuddy {required}, but this is {running}")]
    Incompatible { required: String, running: String },

    #[error("invalid version requirement `{requirement}`: {source}")]
    Requirement {
        requirement: String,
        #[source]
        source: semver::Error,
    },

    #[error("syntax error: {0}")]
    Compile(String),

    #[error("error while initialising: {0}")]
    Initialization(String),

    #[error("entry point does not define `register_commands(registry)`")]
    MissingRegistrationFn,
}

/// A loaded plugin failed while registering its commands.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("register_commands raised an error: {0}")]
    Script(String),

    #[error(transparent)]
    Duplicate(#[from] DuplicateCapability),

    #[error("invalid command name `{0}`")]
    InvalidName(String),

    #[error("command `{command}` points at `{function}`, which is not a one-argument function")]
    InvalidHandler { command: String, function: String },
}

/// Plugin install/remove failures.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid plugin name `{0}`")]
    InvalidName(String),

    #[error("plugin `{name}` is already installed at {}", .path.display())]
    AlreadyInstalled { name: String, path: PathBuf },

    #[error("plugin `{0}` is not installed")]
    NotInstalled(String),

    #[error("invalid plugin URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to download {url}: no response within {limit:?}")]
    DownloadTimedOut { url: String, limit: Duration },

    #[error("failed to download {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid plugin archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("plugin failed to load: {0}")]
    Load(#[from] LoadError),

    #[error("plugin failed to register: {0}")]
    Registration(#[from] RegistrationError),
}

/// A scaffold stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("{0} is not installed")]
    MissingTool(&'static str),

    #[error("expected {} from an earlier stage, but it does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("`{tool}` finished without creating {}", .marker.display())]
    GeneratorProducedNothing { tool: String, marker: PathBuf },
}

impl StageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// `dbuddy format` failures.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no Python files found in {}", .0.display())]
    NoFiles(PathBuf),

    #[error("no modified Python files found in git")]
    NoModifiedFiles,

    #[error("{} does not exist", .0.display())]
    MissingPath(PathBuf),

    #[error("failed to list files under {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("could not read git status (is this a git repository?): {0}")]
    Git(#[source] ProcessError),

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// `dbuddy install <group>` failures.
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("unknown framework group `{0}`. Supported groups: js-frameworks, php-frameworks, java-frameworks, python-frameworks")]
    UnknownGroup(String),

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error("installing {package} failed: {source}")]
    Install {
        package: &'static str,
        #[source]
        source: ProcessError,
    },
}

/// `dbuddy setup-env` failures.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unknown environment `{0}`. Supported: python, node, laravel, react, vue, django")]
    UnknownKind(String),

    #[error("{} is not a directory", .0.display())]
    MissingPath(PathBuf),

    #[error("`{command}` finished without creating {}", .marker.display())]
    NothingCreated { command: String, marker: PathBuf },

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// `dbuddy update-deps` failures.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("unknown package manager `{0}`. Supported: pip, npm, composer")]
    UnknownManager(String),

    #[error("{} is not a directory", .0.display())]
    MissingPath(PathBuf),

    #[error("no requirements.txt, package.json or composer.json in {}; pass --package-manager", .0.display())]
    NoManifest(PathBuf),

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// `dbuddy analyze` failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no Python files in {}; analysis currently supports Python only", .0.display())]
    Unsupported(PathBuf),

    #[error(transparent)]
    Files(FormatError),

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// `dbuddy docs` failures.
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("invalid package name `{0}`")]
    InvalidName(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` finished without creating {}", .marker.display())]
    NothingCreated { command: String, marker: PathBuf },

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value `{value}` for {var}")]
    InvalidEnv { var: &'static str, value: String },
}
