//! Multi-stage project scaffolding
//!
//! A scaffold run checks prerequisites, then drives the stages in a fixed
//! order:
//!
//! 1. `structure` (mandatory): generators, kind files, README, .gitignore
//! 2. `containerize`: Dockerfile, .dockerignore, docker-compose.yml
//! 3. `vcs-init`: `git init` and an initial commit
//! 4. `test-scaffold`: test files inside the project
//! 5. `ci-scaffold`: a GitHub Actions workflow
//!
//! Every write goes through [`ArtifactWriter`], which never overwrites, so
//! re-running against a partially scaffolded directory only fills the gaps.

pub mod outcome;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod writer;

pub use outcome::{summarize, OverallOutcome};
pub use pipeline::{Pipeline, ScaffoldReport};
pub use stage::{Artifact, ArtifactAction, Stage, StageOutcome, StageResult, StageState};
pub use stages::{Applied, StageContext};
pub use writer::ArtifactWriter;

use crate::config::Settings;
use crate::error::PrerequisiteError;
use crate::progress::Progress;
use crate::project::ProjectSpec;
use crate::runtime::{PrerequisiteResolver, Toolchain};
use std::path::Path;

/// Scaffold `spec` into `project_dir`.
///
/// Prerequisite errors are returned before anything is written. Stage
/// failures are recorded in the report instead.
pub async fn scaffold<T: Toolchain, P: Progress>(
    spec: &ProjectSpec,
    project_dir: &Path,
    toolchain: &T,
    progress: &P,
    settings: &Settings,
) -> Result<ScaffoldReport, PrerequisiteError> {
    let prerequisites = PrerequisiteResolver::from_settings(toolchain, progress, settings)
        .ensure(spec.kind())
        .await?;
    tracing::info!(
        kind = %spec.kind(),
        dir = %project_dir.display(),
        "prerequisites satisfied"
    );

    let ctx = StageContext {
        spec,
        project_dir,
        toolchain,
        prerequisites: &prerequisites,
        command_timeout: settings.command_timeout(),
    };
    Ok(Pipeline::new(ctx, progress).run().await)
}
