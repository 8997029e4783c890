//! GitHub Actions workflow

use super::{Applied, StageContext};
use crate::error::StageError;
use crate::runtime::Toolchain;
use crate::scaffold::writer::ArtifactWriter;
use crate::templates::ci::workflow;

const WORKFLOW_PATH: &str = ".github/workflows/main.yml";

pub(super) async fn run<T: Toolchain>(
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    // Picks up a Dockerfile from this run or an earlier one
    let with_docker = writer.exists("Dockerfile");
    writer
        .write(
            WORKFLOW_PATH,
            workflow(ctx.spec.kind().ecosystem(), with_docker),
        )
        .await?;
    Ok(Applied::Done)
}
