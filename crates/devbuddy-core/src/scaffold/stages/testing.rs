//! Test scaffolding inside the project

use super::{Applied, StageContext};
use crate::error::StageError;
use crate::runtime::Toolchain;
use crate::scaffold::writer::ArtifactWriter;
use crate::templates::testing::test_files;

pub(super) async fn run<T: Toolchain>(
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    let files = test_files(ctx.spec);
    if files.is_empty() {
        return Ok(Applied::NotApplicable(format!(
            "{} projects ship their own test setup",
            ctx.spec.kind().display_name()
        )));
    }

    for file in files {
        writer.write(&file.path, &file.contents).await?;
    }
    Ok(Applied::Done)
}
