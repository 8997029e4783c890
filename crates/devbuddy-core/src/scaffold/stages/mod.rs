//! Stage bodies
//!
//! Each stage writes through an [`ArtifactWriter`] rooted at the project
//! directory and reports whether it applied. Turning a stage's return value
//! into a [`StageResult`](super::StageResult) is the pipeline's job.

mod ci;
mod containerize;
mod structure;
mod testing;
mod vcs;

use super::stage::Stage;
use super::writer::ArtifactWriter;
use crate::error::StageError;
use crate::project::ProjectSpec;
use crate::runtime::{Prerequisites, Toolchain};
use std::path::Path;
use std::time::Duration;

/// Everything a stage may read
pub struct StageContext<'a, T> {
    pub spec: &'a ProjectSpec,
    pub project_dir: &'a Path,
    pub toolchain: &'a T,
    pub prerequisites: &'a Prerequisites,
    /// Timeout for each generator or git call
    pub command_timeout: Duration,
}

/// How a stage that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Done,
    /// Nothing to do for this project; the reason is shown to the user
    NotApplicable(String),
}

pub(crate) async fn execute<T: Toolchain>(
    stage: Stage,
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    match stage {
        Stage::Structure => structure::run(ctx, writer).await,
        Stage::Containerize => containerize::run(ctx, writer).await,
        Stage::VcsInit => vcs::run(ctx, writer).await,
        Stage::TestScaffold => testing::run(ctx, writer).await,
        Stage::CiScaffold => ci::run(ctx, writer).await,
    }
}
