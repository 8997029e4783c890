//! git repository with an initial commit

use super::{Applied, StageContext};
use crate::error::StageError;
use crate::runtime::{Invocation, Toolchain};
use crate::scaffold::stage::Artifact;
use crate::scaffold::writer::ArtifactWriter;

const COMMIT_MESSAGE: &str = "Initial commit by devbuddy";

pub(super) async fn run<T: Toolchain>(
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    if !ctx.toolchain.is_available("git") {
        return Err(StageError::MissingTool("git"));
    }
    if writer.exists(".git") {
        return Ok(Applied::NotApplicable(
            "already a git repository".to_string(),
        ));
    }

    let git = |args: &[&str]| {
        Invocation::new("git")
            .args(args.iter().copied())
            .current_dir(ctx.project_dir)
    };

    ctx.toolchain
        .run(&git(&["init"]), ctx.command_timeout)
        .await?;
    writer.record(Artifact::created(".git"));

    ctx.toolchain
        .run(&git(&["add", "."]), ctx.command_timeout)
        .await?;
    ctx.toolchain
        .run(&git(&["commit", "-m", COMMIT_MESSAGE]), ctx.command_timeout)
        .await?;

    Ok(Applied::Done)
}
