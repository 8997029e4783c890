//! Dockerfile, .dockerignore and docker-compose.yml

use super::{Applied, StageContext};
use crate::error::StageError;
use crate::project::ProjectKind;
use crate::runtime::Toolchain;
use crate::scaffold::writer::ArtifactWriter;
use crate::templates::docker::{self, DockerTarget, PythonEntry};

/// Pick the container target from what the structure stage left behind
fn detect_target<T>(
    ctx: &StageContext<'_, T>,
    writer: &ArtifactWriter,
) -> Result<DockerTarget, StageError> {
    let kind = ctx.spec.kind();
    let require = |file: &str| {
        if writer.exists(file) {
            Ok(())
        } else {
            Err(StageError::MissingInput(ctx.project_dir.join(file)))
        }
    };

    let target = match kind {
        ProjectKind::Python | ProjectKind::Flask | ProjectKind::Django | ProjectKind::FastApi => {
            let entry = if writer.exists("manage.py") {
                PythonEntry::Django
            } else if kind == ProjectKind::FastApi && writer.exists("main.py") {
                PythonEntry::Asgi("main".to_string())
            } else if writer.exists("app.py") {
                PythonEntry::Script("app.py".to_string())
            } else if writer.exists("main.py") {
                PythonEntry::Script("main.py".to_string())
            } else {
                return Err(StageError::MissingInput(ctx.project_dir.join("main.py")));
            };
            DockerTarget::Python(entry)
        }
        ProjectKind::React => {
            require("package.json")?;
            DockerTarget::StaticSite {
                dist_dir: "build".to_string(),
            }
        }
        ProjectKind::Vue | ProjectKind::Angular => {
            require("package.json")?;
            DockerTarget::StaticSite {
                dist_dir: "dist".to_string(),
            }
        }
        ProjectKind::Next => {
            require("package.json")?;
            DockerTarget::NextServer
        }
        ProjectKind::Express => {
            require("package.json")?;
            DockerTarget::NodeServer {
                main: "src/index.js".to_string(),
            }
        }
        ProjectKind::Laravel => {
            require("artisan")?;
            DockerTarget::Laravel
        }
        ProjectKind::Spring => {
            require("pom.xml")?;
            DockerTarget::Spring
        }
        ProjectKind::Go => {
            require("go.mod")?;
            DockerTarget::Go
        }
        ProjectKind::Rust => {
            require("Cargo.toml")?;
            DockerTarget::Rust {
                binary: ctx.spec.identifier(),
            }
        }
        ProjectKind::DotNet => {
            let name = ctx.spec.name();
            let project = format!("{}.csproj", name);
            require(project.as_str())?;
            DockerTarget::DotNet {
                assembly: format!("{}.dll", name),
            }
        }
    };
    Ok(target)
}

pub(super) async fn run<T: Toolchain>(
    ctx: &StageContext<'_, T>,
    writer: &mut ArtifactWriter,
) -> Result<Applied, StageError> {
    let target = detect_target(ctx, writer)?;
    tracing::debug!(docker = ?target, "container target");

    let kind = ctx.spec.kind();
    writer.write("Dockerfile", docker::dockerfile(&target)).await?;
    writer
        .write(".dockerignore", docker::dockerignore(kind.ecosystem()))
        .await?;
    writer
        .write("docker-compose.yml", docker::compose(kind, &target))
        .await?;
    Ok(Applied::Done)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{context, spec};
    use super::*;
    use crate::runtime::Prerequisites;
    use crate::testing::FakeToolchain;

    fn target_for(kind: ProjectKind, files: &[&str]) -> Result<DockerTarget, StageError> {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), "").unwrap();
        }
        let spec = spec(kind);
        let toolchain = FakeToolchain::new();
        let prereqs = Prerequisites::default();
        let ctx = context(&spec, dir.path(), &toolchain, &prereqs);
        detect_target(&ctx, &ArtifactWriter::new(dir.path()))
    }

    #[test]
    fn test_python_entry_precedence() {
        assert_eq!(
            target_for(ProjectKind::Django, &["manage.py", "main.py"]).unwrap(),
            DockerTarget::Python(PythonEntry::Django)
        );
        assert_eq!(
            target_for(ProjectKind::FastApi, &["main.py"]).unwrap(),
            DockerTarget::Python(PythonEntry::Asgi("main".into()))
        );
        assert_eq!(
            target_for(ProjectKind::Flask, &["app.py", "main.py"]).unwrap(),
            DockerTarget::Python(PythonEntry::Script("app.py".into()))
        );
        assert_eq!(
            target_for(ProjectKind::Python, &["main.py"]).unwrap(),
            DockerTarget::Python(PythonEntry::Script("main.py".into()))
        );
    }

    #[test]
    fn test_missing_structure_output_is_reported() {
        let err = target_for(ProjectKind::Go, &[]).unwrap_err();
        assert!(matches!(err, StageError::MissingInput(p) if p.ends_with("go.mod")));
        assert!(target_for(ProjectKind::Python, &[]).is_err());
    }

    #[tokio::test]
    async fn test_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        let spec = spec(ProjectKind::Rust);
        let toolchain = FakeToolchain::new();
        let prereqs = Prerequisites::default();
        let ctx = context(&spec, dir.path(), &toolchain, &prereqs);

        let mut writer = ArtifactWriter::new(dir.path());
        run(&ctx, &mut writer).await.unwrap();

        assert_eq!(writer.artifacts().len(), 3);
        let dockerfile = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
        assert!(dockerfile.contains("target/release/demo"));
    }
}
