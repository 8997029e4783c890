//! Sequential stage driver

use super::outcome::{summarize, OverallOutcome};
use super::stage::{Stage, StageOutcome, StageResult, StageState};
use super::stages::{execute, Applied, StageContext};
use super::writer::ArtifactWriter;
use crate::progress::Progress;
use crate::project::ProjectFlags;
use crate::runtime::Toolchain;
use std::path::PathBuf;

/// Record of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub project_dir: PathBuf,
    /// One per stage that reached a terminal state, in stage order
    pub results: Vec<StageResult>,
    states: [StageState; Stage::ALL.len()],
    pub outcome: OverallOutcome,
}

impl ScaffoldReport {
    pub fn state(&self, stage: Stage) -> StageState {
        self.states[stage as usize]
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }
}

fn is_requested(stage: Stage, flags: ProjectFlags) -> bool {
    match stage {
        Stage::Structure => true,
        Stage::Containerize => flags.dockerize,
        Stage::VcsInit => flags.git_init,
        Stage::TestScaffold => flags.with_tests,
        Stage::CiScaffold => flags.auto_ci,
    }
}

/// Runs stages in [`Stage::ALL`] order.
///
/// A failing mandatory stage stops the run and leaves later stages
/// `Pending`. Optional stages fail on their own.
pub struct Pipeline<'a, T, P> {
    ctx: StageContext<'a, T>,
    progress: &'a P,
    states: [StageState; Stage::ALL.len()],
    results: Vec<StageResult>,
}

impl<'a, T: Toolchain, P: Progress> Pipeline<'a, T, P> {
    pub fn new(ctx: StageContext<'a, T>, progress: &'a P) -> Self {
        Self {
            ctx,
            progress,
            states: Default::default(),
            results: Vec::with_capacity(Stage::ALL.len()),
        }
    }

    fn transition(&mut self, stage: Stage, state: StageState) {
        tracing::debug!(stage = %stage, from = %self.states[stage as usize], to = %state, "stage transition");
        self.states[stage as usize] = state;
    }

    fn finish(&mut self, result: StageResult) {
        self.transition(result.stage, result.outcome.into());
        self.results.push(result);
    }

    pub async fn run(mut self) -> ScaffoldReport {
        for stage in Stage::ALL {
            if !is_requested(stage, self.ctx.spec.flags()) {
                self.finish(StageResult::skipped(stage, "not requested"));
                continue;
            }

            let result = self.run_stage(stage).await;
            let halt = stage.is_mandatory() && result.outcome == StageOutcome::Failed;
            self.finish(result);
            if halt {
                tracing::warn!(stage = %stage, "mandatory stage failed, halting");
                break;
            }
        }

        ScaffoldReport {
            project_dir: self.ctx.project_dir.to_path_buf(),
            outcome: summarize(&self.results),
            results: self.results,
            states: self.states,
        }
    }

    async fn run_stage(&mut self, stage: Stage) -> StageResult {
        self.transition(stage, StageState::Running);
        self.progress.start(stage.label());

        let mut writer = ArtifactWriter::new(self.ctx.project_dir);
        let applied = execute(stage, &self.ctx, &mut writer).await;
        let artifacts = writer.into_artifacts();

        match applied {
            Ok(Applied::Done) => {
                let created = artifacts.iter().filter(|a| a.is_created()).count();
                let skipped = artifacts.len() - created;
                // The mandatory stage counts as done even when everything pre-existed
                let outcome = if created > 0 || stage.is_mandatory() {
                    StageOutcome::Completed
                } else {
                    StageOutcome::Skipped
                };
                let detail = match (created, skipped) {
                    (0, 0) => "nothing to do".to_string(),
                    (0, _) => "already present".to_string(),
                    (_, 0) => format!("{} created", created),
                    (_, _) => format!("{} created, {} already present", created, skipped),
                };
                tracing::info!(stage = %stage, created, skipped, "stage finished");
                self.progress.stop(&format!("{}: {}", stage.label(), detail));
                StageResult {
                    stage,
                    outcome,
                    detail,
                    artifacts,
                }
            }
            Ok(Applied::NotApplicable(reason)) => {
                tracing::info!(stage = %stage, reason = %reason, "stage skipped");
                self.progress.stop(&format!("{}: {}", stage.label(), reason));
                StageResult {
                    stage,
                    outcome: StageOutcome::Skipped,
                    detail: reason,
                    artifacts,
                }
            }
            Err(e) => {
                let created = artifacts.iter().any(|a| a.is_created());
                let detail = if created {
                    format!("{} (some files were already written)", e)
                } else {
                    format!("{} (no files were written)", e)
                };
                tracing::warn!(stage = %stage, error = %e, "stage failed");
                self.progress.stop(&format!("{} failed", stage.label()));
                self.progress.warn(&format!("{}: {}", stage, detail));
                StageResult::failed(stage, detail, artifacts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectKind, ProjectSpec};
    use crate::runtime::Prerequisites;
    use crate::testing::{FakeToolchain, RecordingProgress};
    use std::time::Duration;

    async fn run_pipeline(
        spec: &ProjectSpec,
        dir: &std::path::Path,
        toolchain: &FakeToolchain,
    ) -> ScaffoldReport {
        let prereqs = Prerequisites::default();
        let progress = RecordingProgress::new();
        let ctx = StageContext {
            spec,
            project_dir: dir,
            toolchain,
            prerequisites: &prereqs,
            command_timeout: Duration::from_secs(5),
        };
        Pipeline::new(ctx, &progress).run().await
    }

    #[tokio::test]
    async fn test_mandatory_failure_leaves_later_stages_pending() {
        let dir = tempfile::tempdir().unwrap();
        let flags = ProjectFlags {
            dockerize: true,
            git_init: true,
            with_tests: true,
            auto_ci: true,
        };
        let spec = ProjectSpec::new("demo", ProjectKind::React, flags).unwrap();
        // npx runs but produces nothing
        let toolchain = FakeToolchain::new().with_tools(["npx", "git"]);

        let report = run_pipeline(&spec, dir.path(), &toolchain).await;

        assert!(!report.outcome.success);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.state(Stage::Structure), StageState::Failed);
        for stage in &Stage::ALL[1..] {
            assert_eq!(report.state(*stage), StageState::Pending);
            assert!(report.result(*stage).is_none());
        }
        assert_eq!(toolchain.commands(), ["npx create-react-app ."]);
    }

    #[tokio::test]
    async fn test_optional_failure_does_not_stop_later_stages() {
        let dir = tempfile::tempdir().unwrap();
        let flags = ProjectFlags {
            git_init: true,
            auto_ci: true,
            ..Default::default()
        };
        let spec = ProjectSpec::new("demo", ProjectKind::Go, flags).unwrap();
        let toolchain = FakeToolchain::new();

        let report = run_pipeline(&spec, dir.path(), &toolchain).await;

        assert!(report.outcome.success);
        assert_eq!(report.outcome.failed_stages, ["vcs-init"]);
        assert_eq!(report.state(Stage::CiScaffold), StageState::Completed);
        assert!(report.result(Stage::VcsInit).unwrap().detail.contains("git"));
    }

    #[tokio::test]
    async fn test_rerun_skips_everything_but_stays_successful() {
        let dir = tempfile::tempdir().unwrap();
        let flags = ProjectFlags {
            dockerize: true,
            ..Default::default()
        };
        let spec = ProjectSpec::new("demo", ProjectKind::Go, flags).unwrap();
        let toolchain = FakeToolchain::new();

        run_pipeline(&spec, dir.path(), &toolchain).await;
        let again = run_pipeline(&spec, dir.path(), &toolchain).await;

        assert!(again.outcome.success);
        assert!(!again.outcome.changes_made);
        assert_eq!(again.state(Stage::Structure), StageState::Completed);
        assert_eq!(again.state(Stage::Containerize), StageState::Skipped);
        assert_eq!(
            again.result(Stage::Structure).unwrap().detail,
            "already present"
        );
    }
}
