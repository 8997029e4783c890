//! Python code formatting through black, autopep8, yapf or isort

use crate::config::Settings;
use crate::error::FormatError;
use crate::progress::Progress;
use crate::runtime::{AuxiliaryTool, Installer, Invocation, PrerequisiteResolver, Toolchain};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into when collecting files
const SKIPPED_DIRS: &[&str] = &["__pycache__", "venv", "node_modules"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatTool {
    #[default]
    Black,
    Autopep8,
    Yapf,
    Isort,
}

impl FormatTool {
    pub const ALL: [FormatTool; 4] = [
        FormatTool::Black,
        FormatTool::Autopep8,
        FormatTool::Yapf,
        FormatTool::Isort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTool::Black => "black",
            FormatTool::Autopep8 => "autopep8",
            FormatTool::Yapf => "yapf",
            FormatTool::Isort => "isort",
        }
    }

    /// The pip package providing the executable of the same name
    pub fn auxiliary(&self) -> AuxiliaryTool {
        match self {
            FormatTool::Black => AuxiliaryTool::new("black", "black", Installer::Pip, &["black"]),
            FormatTool::Autopep8 => {
                AuxiliaryTool::new("autopep8", "autopep8", Installer::Pip, &["autopep8"])
            }
            FormatTool::Yapf => AuxiliaryTool::new("yapf", "yapf", Installer::Pip, &["yapf"]),
            FormatTool::Isort => AuxiliaryTool::new("isort", "isort", Installer::Pip, &["isort"]),
        }
    }

    /// In-place formatting of `files`
    pub fn invocation(&self, files: &[PathBuf]) -> Invocation {
        let base = Invocation::new(self.as_str());
        let base = match self {
            FormatTool::Autopep8 => base.args(["--in-place", "--aggressive", "--aggressive"]),
            FormatTool::Yapf => base.arg("--in-place"),
            FormatTool::Black | FormatTool::Isort => base,
        };
        base.args(files.iter().map(|f| f.to_string_lossy().into_owned()))
    }
}

impl fmt::Display for FormatTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported formatter `{}`", s))
    }
}

/// What `dbuddy format` was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub path: PathBuf,
    pub tool: FormatTool,
    /// Format only files git reports as modified or untracked
    pub use_git: bool,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSummary {
    pub tool: FormatTool,
    pub files: Vec<PathBuf>,
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0
        && entry.file_type().is_dir()
        && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Python files at `path`: the file itself, or a directory's `.py` files
pub fn collect_files(path: &Path, recursive: bool) -> Result<Vec<PathBuf>, FormatError> {
    if !path.exists() {
        return Err(FormatError::MissingPath(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
    {
        let entry = entry.map_err(|source| FormatError::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_python(entry.path()) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(FormatError::NoFiles(path.to_path_buf()));
    }
    Ok(files)
}

/// Python files from `git status --porcelain -z` output, excluding deletions
pub fn modified_python_files(porcelain: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut records = porcelain.split('\0');
    while let Some(record) = records.next() {
        let (Some(status), Some(path)) = (record.get(..2), record.get(3..)) else {
            continue;
        };
        // A rename or copy is followed by a record holding the source path
        if status.contains(['R', 'C']) {
            records.next();
        }
        if !status.contains('D') && !path.is_empty() {
            files.push(PathBuf::from(path));
        }
    }
    files.retain(|path| is_python(path));
    files
}

async fn git_files<T: Toolchain>(
    toolchain: &T,
    dir: &Path,
    settings: &Settings,
) -> Result<Vec<PathBuf>, FormatError> {
    let git = |args: &[&str]| {
        Invocation::new("git")
            .args(args.iter().copied())
            .current_dir(dir)
    };
    let limit = settings.command_timeout();

    let top = toolchain
        .capture(&git(&["rev-parse", "--show-toplevel"]), limit)
        .await
        .map_err(FormatError::Git)?;
    let status = toolchain
        .capture(
            &git(&["status", "--porcelain", "-z", "--untracked-files=all"]),
            limit,
        )
        .await
        .map_err(FormatError::Git)?;

    let root = PathBuf::from(top.trim());
    let files: Vec<_> = modified_python_files(&status)
        .into_iter()
        .map(|relative| root.join(relative))
        .collect();
    if files.is_empty() {
        return Err(FormatError::NoModifiedFiles);
    }
    Ok(files)
}

/// Format the requested files, installing the formatter with pip when missing
pub async fn format_code<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    settings: &Settings,
    request: &FormatRequest,
) -> Result<FormatSummary, FormatError> {
    let files = if request.use_git {
        git_files(toolchain, &request.path, settings).await?
    } else {
        collect_files(&request.path, request.recursive)?
    };

    PrerequisiteResolver::from_settings(toolchain, progress, settings)
        .ensure_python_tool(&request.tool.auxiliary())
        .await?;

    tracing::info!(tool = %request.tool, files = files.len(), "formatting");
    progress.start(&format!(
        "Formatting {} files with {}",
        files.len(),
        request.tool
    ));
    let result = toolchain
        .run(&request.tool.invocation(&files), settings.command_timeout())
        .await;
    match &result {
        Ok(()) => progress.stop(&format!("Code formatted with {}", request.tool)),
        Err(_) => progress.stop(&format!("{} failed", request.tool)),
    }
    result?;

    Ok(FormatSummary {
        tool: request.tool,
        files,
    })
}
