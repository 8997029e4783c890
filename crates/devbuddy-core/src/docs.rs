//! `dbuddy docs`: a Sphinx documentation skeleton under `docs/<package>`

use crate::config::Settings;
use crate::error::DocsError;
use crate::progress::Progress;
use crate::project::is_valid_project_name;
use crate::runtime::{AuxiliaryTool, Installer, Invocation, PrerequisiteResolver, Toolchain};
use crate::scaffold::Artifact;
use std::path::{Path, PathBuf};

pub const SPHINX: AuxiliaryTool = AuxiliaryTool::new(
    "Sphinx",
    "sphinx-quickstart",
    Installer::Pip,
    &["sphinx", "sphinx-rtd-theme"],
);

const DEFAULT_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsRequest {
    pub package: String,
    /// Falls back to `git config user.name`
    pub author: Option<String>,
    /// Project root; docs go to `<root>/docs/<package>`
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsSummary {
    /// `docs/<package>`, created or already present
    pub artifact: Artifact,
    pub build_hint: String,
}

async fn git_author<T: Toolchain>(toolchain: &T, settings: &Settings, root: &Path) -> String {
    let git = Invocation::new("git")
        .args(["config", "user.name"])
        .current_dir(root);
    match toolchain.capture(&git, settings.command_timeout()).await {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => DEFAULT_AUTHOR.to_string(),
    }
}

/// Run `sphinx-quickstart` for `request.package` unless its `conf.py` exists
pub async fn init_docs<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    settings: &Settings,
    request: &DocsRequest,
) -> Result<DocsSummary, DocsError> {
    if !is_valid_project_name(&request.package) {
        return Err(DocsError::InvalidName(request.package.clone()));
    }
    let relative = Path::new("docs").join(&request.package);
    let build_hint = format!("cd {} && make html", relative.display());
    let conf = relative.join("conf.py");

    if request.root.join(&conf).is_file() {
        tracing::debug!(path = %conf.display(), "docs already initialized");
        return Ok(DocsSummary {
            artifact: Artifact::skipped(relative),
            build_hint,
        });
    }

    PrerequisiteResolver::from_settings(toolchain, progress, settings)
        .ensure_python_tool(&SPHINX)
        .await?;

    let target = request.root.join(&relative);
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|source| DocsError::Io {
            path: target.clone(),
            source,
        })?;

    let author = match &request.author {
        Some(author) => author.clone(),
        None => git_author(toolchain, settings, &request.root).await,
    };
    let quickstart = Invocation::new(SPHINX.program)
        .args(["--quiet", "--project", request.package.as_str()])
        .args(["--author", author.as_str()])
        .arg(relative.to_string_lossy())
        .current_dir(&request.root);

    progress.start(&format!("Creating documentation for {}...", request.package));
    if let Err(e) = toolchain.run(&quickstart, settings.command_timeout()).await {
        progress.stop("Creating documentation failed");
        return Err(e.into());
    }
    progress.stop(&format!("Documentation created in {}", relative.display()));

    if !request.root.join(&conf).is_file() {
        return Err(DocsError::NothingCreated {
            command: quickstart.to_string(),
            marker: conf,
        });
    }
    Ok(DocsSummary {
        artifact: Artifact::created(relative),
        build_hint,
    })
}
