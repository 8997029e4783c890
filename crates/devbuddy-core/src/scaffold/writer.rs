//! Existence-guarded file writes inside a project directory

use super::stage::Artifact;
use crate::error::StageError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes files under one root and records what happened to each.
///
/// Files are created with `create_new`, so an existing file is never
/// overwritten, even if it appears between check and write.
#[derive(Debug)]
pub struct ArtifactWriter {
    root: PathBuf,
    artifacts: Vec<Artifact>,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.root.join(relative).exists()
    }

    /// Write `contents` to `relative` unless it already exists
    pub async fn write(
        &mut self,
        relative: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<&Artifact, StageError> {
        let relative = relative.as_ref();
        let target = self.root.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StageError::io(parent, e))?;
        }

        let artifact = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(mut file) => {
                file.write_all(contents.as_ref())
                    .await
                    .map_err(|e| StageError::io(&target, e))?;
                file.flush().await.map_err(|e| StageError::io(&target, e))?;
                tracing::debug!(path = %relative.display(), "created");
                Artifact::created(relative)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %relative.display(), "exists, skipped");
                Artifact::skipped(relative)
            }
            Err(e) => return Err(StageError::io(&target, e)),
        };

        Ok(self.push(artifact))
    }

    /// Create a directory unless it already exists
    pub async fn dir(&mut self, relative: impl AsRef<Path>) -> Result<&Artifact, StageError> {
        let relative = relative.as_ref();
        let target = self.root.join(relative);
        let artifact = if target.is_dir() {
            Artifact::skipped(relative)
        } else {
            fs::create_dir_all(&target)
                .await
                .map_err(|e| StageError::io(&target, e))?;
            Artifact::created(relative)
        };
        Ok(self.push(artifact))
    }

    /// Record a path produced by an external generator
    pub fn record(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    fn push(&mut self, artifact: Artifact) -> &Artifact {
        self.artifacts.push(artifact);
        &self.artifacts[self.artifacts.len() - 1]
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::stage::ArtifactAction;

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "mine").unwrap();

        let mut writer = ArtifactWriter::new(dir.path());
        let artifact = writer.write("README.md", "generated").await.unwrap();
        assert_eq!(artifact.action, ArtifactAction::Skipped);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "mine"
        );
    }

    #[tokio::test]
    async fn test_nested_paths_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path());
        writer
            .write(".github/workflows/main.yml", "name: CI")
            .await
            .unwrap();
        writer.dir("static").await.unwrap();
        writer.dir("static").await.unwrap();

        assert!(dir.path().join(".github/workflows/main.yml").is_file());
        let actions: Vec<_> = writer.artifacts().iter().map(|a| a.action).collect();
        assert_eq!(
            actions,
            [ArtifactAction::Created, ArtifactAction::Created, ArtifactAction::Skipped]
        );
    }
}
