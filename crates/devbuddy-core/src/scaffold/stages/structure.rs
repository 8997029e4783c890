//! Base project structure: framework generators, kind files, README and .gitignore

use super::{Applied, StageContext};
use crate::error::StageError;
use crate::project::ProjectKind;
use crate::runtime::{Invocation, Toolchain};
use crate::scaffold::stage::Artifact;
use crate::scaffold::writer::ArtifactWriter;
use crate::templates::base;
use std::path::PathBuf;

/// An external generator and the path that proves it already ran
struct Generator {
    invocation: Invocation,
    marker: PathBuf,
}

impl Generator {
    fn new(invocation: Invocation, marker: impl Into<PathBuf>) -> Self {
        Self {
            invocation,
            marker: marker.into(),
        }
    }
}

fn generators<T>(ctx: &StageContext<'_, T>) -> Vec<Generator> {
    let name = ctx.spec.name();
    let npx = |args: &[&str]| Invocation::new("npx").args(args.iter().copied());

    match ctx.spec.kind() {
        ProjectKind::Django => vec![
            Generator::new(
                Invocation::new("django-admin").args(["startproject", "config", "."]),
                "manage.py",
            ),
            Generator::new(
                Invocation::new(ctx.prerequisites.python()).args(["manage.py", "startapp", "core"]),
                "core",
            ),
        ],
        ProjectKind::React => vec![Generator::new(npx(&["create-react-app", "."]), "package.json")],
        ProjectKind::Next => vec![Generator::new(
            npx(&["create-next-app@latest", ".", "--ts"]),
            "package.json",
        )],
        ProjectKind::Vue => vec![Generator::new(
            Invocation::new("vue").args(["create", ".", "--default"]),
            "package.json",
        )],
        ProjectKind::Angular => vec![Generator::new(
            Invocation::new("ng").args(["new", name, "--directory", ".", "--defaults"]),
            "angular.json",
        )],
        ProjectKind::Laravel => vec![Generator::new(
            Invocation::new("composer").args([
                "create-project",
                "--prefer-dist",
                "laravel/laravel",
                ".",
            ]),
            "artisan",
        )],
        ProjectKind::DotNet => vec![Generator::new(
            Invocation::new("dotnet").args([
                "new",
                "webapi",
                "--no-https",
                "--name",
                name,
                "--output",
                ".",
            ]),
            format!("{}.csproj", name),
        )],
        ProjectKind::Python
        | ProjectKind::Flask
        | ProjectKind::FastApi
        | ProjectKind::Express
        | ProjectKind::Spring
        | ProjectKind::Go
        | ProjectKind::Rust => Vec::new(),
    }
}

pub(super) async fn run<T: Toolchain>(
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    if !ctx.project_dir.is_dir() {
        tokio::fs::create_dir_all(ctx.project_dir)
            .await
            .map_err(|e| StageError::io(ctx.project_dir, e))?;
        writer.record(Artifact::created("."));
    }

    // Generators refuse non-empty directories, so they go before our own files
    for generator in generators(ctx) {
        if writer.exists(&generator.marker) {
            tracing::debug!(marker = %generator.marker.display(), "generator output present");
            writer.record(Artifact::skipped(&generator.marker));
            continue;
        }

        let invocation = generator.invocation.current_dir(ctx.project_dir);
        ctx.toolchain.run(&invocation, ctx.command_timeout).await?;

        if !writer.exists(&generator.marker) {
            return Err(StageError::GeneratorProducedNothing {
                tool: invocation.to_string(),
                marker: generator.marker,
            });
        }
        writer.record(Artifact::created(&generator.marker));
    }

    for file in base::kind_files(ctx.spec) {
        writer.write(&file.path, &file.contents).await?;
    }
    writer.write("README.md", base::readme(ctx.spec)).await?;
    writer
        .write(".gitignore", base::gitignore(ctx.spec.kind().ecosystem()))
        .await?;

    Ok(Applied::Done)
}
