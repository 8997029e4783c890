//! Stage identities, states and result records

use std::fmt;
use std::path::PathBuf;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Structure,
    Containerize,
    VcsInit,
    TestScaffold,
    CiScaffold,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Structure,
        Stage::Containerize,
        Stage::VcsInit,
        Stage::TestScaffold,
        Stage::CiScaffold,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Structure => "structure",
            Stage::Containerize => "containerize",
            Stage::VcsInit => "vcs-init",
            Stage::TestScaffold => "test-scaffold",
            Stage::CiScaffold => "ci-scaffold",
        }
    }

    /// A mandatory stage's failure halts the pipeline
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Stage::Structure)
    }

    /// Human-readable label for spinners
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Structure => "Creating project structure",
            Stage::Containerize => "Adding Docker configuration",
            Stage::VcsInit => "Initializing git repository",
            Stage::TestScaffold => "Setting up tests",
            Stage::CiScaffold => "Adding CI workflow",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-stage state machine: `Pending -> Running -> {Completed, Failed, Skipped}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Terminal outcome recorded for a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Skipped,
    Failed,
}

impl From<StageOutcome> for StageState {
    fn from(outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Completed => StageState::Completed,
            StageOutcome::Skipped => StageState::Skipped,
            StageOutcome::Failed => StageState::Failed,
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        StageState::from(*self).fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactAction {
    Created,
    /// Already existed; left untouched
    Skipped,
}

/// A path a stage created or found already present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative to the project directory
    pub path: PathBuf,
    pub action: ArtifactAction,
}

impl Artifact {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            action: ArtifactAction::Created,
        }
    }

    pub fn skipped(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            action: ArtifactAction::Skipped,
        }
    }

    pub fn is_created(&self) -> bool {
        self.action == ArtifactAction::Created
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub detail: String,
    pub artifacts: Vec<Artifact>,
}

impl StageResult {
    pub fn skipped(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped,
            detail: detail.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn failed(stage: Stage, detail: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failed,
            detail: detail.into(),
            artifacts,
        }
    }

    pub fn created(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.is_created())
    }
}
