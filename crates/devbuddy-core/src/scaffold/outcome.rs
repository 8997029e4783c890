//! Aggregation of stage results into one verdict

use super::stage::{StageOutcome, StageResult};

/// Final status of a scaffold run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverallOutcome {
    /// The mandatory stage completed. Optional failures do not affect this.
    pub success: bool,
    /// Names of every stage that failed, mandatory or not
    pub failed_stages: Vec<String>,
    /// At least one file or directory was created
    pub changes_made: bool,
}

pub fn summarize(results: &[StageResult]) -> OverallOutcome {
    let success = results
        .iter()
        .filter(|r| r.stage.is_mandatory())
        .all(|r| r.outcome == StageOutcome::Completed)
        && results.iter().any(|r| r.stage.is_mandatory());

    OverallOutcome {
        success,
        failed_stages: results
            .iter()
            .filter(|r| r.outcome == StageOutcome::Failed)
            .map(|r| r.stage.name().to_string())
            .collect(),
        changes_made: results.iter().any(|r| r.created().next().is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::stage::{Artifact, Stage};

    fn completed(stage: Stage) -> StageResult {
        StageResult {
            stage,
            outcome: StageOutcome::Completed,
            detail: String::new(),
            artifacts: vec![Artifact::created("README.md")],
        }
    }

    #[test]
    fn test_optional_failure_is_advisory() {
        let results = [
            completed(Stage::Structure),
            StageResult::failed(Stage::VcsInit, "git is not installed", Vec::new()),
            StageResult::skipped(Stage::CiScaffold, "not requested"),
        ];
        let outcome = summarize(&results);
        assert!(outcome.success);
        assert_eq!(outcome.failed_stages, ["vcs-init"]);
        assert!(outcome.changes_made);
    }

    #[test]
    fn test_mandatory_failure_is_blocking() {
        let results = [StageResult::failed(
            Stage::Structure,
            "permission denied",
            Vec::new(),
        )];
        let outcome = summarize(&results);
        assert!(!outcome.success);
        assert_eq!(outcome.failed_stages, ["structure"]);
        assert!(!outcome.changes_made);
    }

    #[test]
    fn test_no_results_is_not_success() {
        assert!(!summarize(&[]).success);
    }
}
