use devbuddy_core::error::PrerequisiteError;
use devbuddy_core::scaffold::{ArtifactAction, StageOutcome, StageState};
use devbuddy_core::testing::{FakeToolchain, Journal, RecordingProgress};
use devbuddy_core::{scaffold, ProjectFlags, ProjectKind, ProjectSpec, Settings, Stage};
use std::path::Path;

fn settings(auto_install: bool) -> Settings {
    Settings {
        auto_install,
        ..Settings::default()
    }
}

fn spec(kind: ProjectKind, flags: ProjectFlags) -> ProjectSpec {
    ProjectSpec::new("demo", kind, flags).unwrap()
}

fn outcomes(report: &devbuddy_core::ScaffoldReport) -> Vec<(Stage, StageOutcome)> {
    report.results.iter().map(|r| (r.stage, r.outcome)).collect()
}

/// A toolchain on which every kind's runtimes, CLIs and generators work
fn full_toolchain() -> FakeToolchain {
    FakeToolchain::new()
        .with_tools([
            "python3",
            "flask",
            "django-admin",
            "uvicorn",
            "node",
            "npm",
            "npx",
            "vue",
            "ng",
            "php",
            "composer",
            "java",
            "go",
            "cargo",
            "dotnet",
            "git",
        ])
        .creates("django-admin startproject", "manage.py")
        .creates("python3 manage.py", "core/")
        .creates("npx create-react-app", "package.json")
        .creates("npx create-next-app@latest", "package.json")
        .creates("vue create", "package.json")
        .creates("ng new", "angular.json")
        .creates("composer create-project", "artisan")
        .creates("dotnet new", "demo.csproj")
}

#[tokio::test]
async fn test_every_kind_builds_its_structure() {
    for kind in ProjectKind::ALL {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        let toolchain = full_toolchain();

        let report = scaffold(
            &spec(kind, ProjectFlags::default()),
            &dir,
            &toolchain,
            &RecordingProgress::new(),
            &settings(false),
        )
        .await
        .unwrap_or_else(|e| panic!("{kind}: {e}"));

        assert_eq!(
            report.state(Stage::Structure),
            StageState::Completed,
            "{kind}: {:?}",
            report.result(Stage::Structure)
        );
        assert!(report.outcome.success, "{kind}");
        assert!(dir.join("README.md").is_file(), "{kind}");
        assert!(dir.join(".gitignore").is_file(), "{kind}");
    }
}

#[tokio::test]
async fn test_python_with_docker_and_tests() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = FakeToolchain::new().with_tools(["python3"]);
    let flags = ProjectFlags {
        dockerize: true,
        with_tests: true,
        ..Default::default()
    };

    let report = scaffold(
        &spec(ProjectKind::Python, flags),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(true),
    )
    .await
    .unwrap();

    assert_eq!(
        outcomes(&report),
        [
            (Stage::Structure, StageOutcome::Completed),
            (Stage::Containerize, StageOutcome::Completed),
            (Stage::VcsInit, StageOutcome::Skipped),
            (Stage::TestScaffold, StageOutcome::Completed),
            (Stage::CiScaffold, StageOutcome::Skipped),
        ]
    );
    assert!(report.outcome.success);
    assert!(report.outcome.failed_stages.is_empty());
    assert!(dir.join("Dockerfile").is_file());
    assert!(dir.join("tests/test_basic.py").is_file());
    // nothing ran; no generator or install was needed
    assert!(toolchain.commands().is_empty());
}

#[tokio::test]
async fn test_rerun_never_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = FakeToolchain::new().with_tools(["python3", "flask"]);
    let spec = spec(ProjectKind::Flask, ProjectFlags::default());

    scaffold(&spec, &dir, &toolchain, &RecordingProgress::new(), &settings(false))
        .await
        .unwrap();
    std::fs::write(dir.join("app.py"), "# edited by hand\n").unwrap();

    let second = scaffold(&spec, &dir, &toolchain, &RecordingProgress::new(), &settings(false))
        .await
        .unwrap();

    let structure = second.result(Stage::Structure).unwrap();
    assert_eq!(structure.outcome, StageOutcome::Completed);
    assert!(!structure.artifacts.is_empty());
    assert!(structure
        .artifacts
        .iter()
        .all(|a| a.action == ArtifactAction::Skipped));
    assert_eq!(
        std::fs::read_to_string(dir.join("app.py")).unwrap(),
        "# edited by hand\n"
    );
}

#[tokio::test]
async fn test_generator_is_not_rerun_when_marker_exists() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("package.json"), "{}").unwrap();
    let toolchain = full_toolchain();

    let report = scaffold(
        &spec(ProjectKind::React, ProjectFlags::default()),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(false),
    )
    .await
    .unwrap();

    assert!(report.outcome.success);
    assert!(!toolchain.commands().iter().any(|c| c.starts_with("npx")));
    assert_eq!(std::fs::read_to_string(dir.join("package.json")).unwrap(), "{}");
}

#[tokio::test]
async fn test_structure_failure_halts_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = full_toolchain().failing("npx");
    let flags = ProjectFlags {
        dockerize: true,
        git_init: true,
        with_tests: true,
        auto_ci: true,
    };

    let report = scaffold(
        &spec(ProjectKind::React, flags),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(false),
    )
    .await
    .unwrap();

    assert_eq!(outcomes(&report), [(Stage::Structure, StageOutcome::Failed)]);
    for stage in &Stage::ALL[1..] {
        assert_eq!(report.state(*stage), StageState::Pending);
    }
    assert!(!report.outcome.success);
    assert_eq!(report.outcome.failed_stages, ["structure"]);
    assert!(!toolchain.commands().iter().any(|c| c.starts_with("git")));
    assert!(!dir.join("Dockerfile").exists());
}

#[tokio::test]
async fn test_optional_failure_is_advisory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    // no git on PATH
    let toolchain = FakeToolchain::new().with_tools(["go"]);
    let flags = ProjectFlags {
        git_init: true,
        auto_ci: true,
        ..Default::default()
    };

    let report = scaffold(
        &spec(ProjectKind::Go, flags),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(false),
    )
    .await
    .unwrap();

    assert_eq!(report.state(Stage::VcsInit), StageState::Failed);
    assert_eq!(report.state(Stage::CiScaffold), StageState::Completed);
    assert!(report.outcome.success);
    assert_eq!(report.outcome.failed_stages, ["vcs-init"]);
    assert!(report.outcome.changes_made);
    assert!(dir.join(".github/workflows/main.yml").is_file());
}

#[tokio::test]
async fn test_git_init_commits_what_was_written() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = FakeToolchain::new()
        .with_tools(["cargo", "git"])
        .creates("git init", ".git/");
    let flags = ProjectFlags {
        git_init: true,
        ..Default::default()
    };

    let report = scaffold(
        &spec(ProjectKind::Rust, flags),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(false),
    )
    .await
    .unwrap();

    assert_eq!(report.state(Stage::VcsInit), StageState::Completed);
    let git: Vec<_> = toolchain
        .commands()
        .into_iter()
        .filter(|c| c.starts_with("git"))
        .collect();
    assert_eq!(git.len(), 3);
    assert_eq!(git[0], "git init");
    assert!(dir.join(".git").is_dir());
}

#[tokio::test]
async fn test_missing_runtime_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = FakeToolchain::new().with_tools(["npm", "vue"]);

    let err = scaffold(
        &spec(ProjectKind::Vue, ProjectFlags::default()),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(true),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PrerequisiteError::MissingRuntime { runtime: "Node.js", .. }));
    assert!(!dir.exists());
    assert!(toolchain.commands().is_empty());
}

#[tokio::test]
async fn test_missing_cli_without_auto_install_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let toolchain = FakeToolchain::new().with_tools(["node", "npm"]);

    let err = scaffold(
        &spec(ProjectKind::Angular, ProjectFlags::default()),
        &dir,
        &toolchain,
        &RecordingProgress::new(),
        &settings(false),
    )
    .await
    .unwrap_err();

    match err {
        PrerequisiteError::AuxiliaryMissing { tool, install } => {
            assert_eq!(tool, "Angular CLI");
            assert_eq!(install, "npm install -g @angular/cli");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.exists());
    assert!(toolchain.commands().is_empty());
}

#[tokio::test]
async fn test_global_install_is_announced_first() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("demo");
    let journal = Journal::default();
    let toolchain = FakeToolchain::new()
        .with_tools(["node", "npm"])
        .installs("npm install", "vue")
        .creates("vue create", "package.json")
        .with_journal(journal.clone());
    let progress = RecordingProgress::with_journal(journal.clone());

    let report = scaffold(
        &spec(ProjectKind::Vue, ProjectFlags::default()),
        &dir,
        &toolchain,
        &progress,
        &settings(true),
    )
    .await
    .unwrap();
    assert!(report.outcome.success);

    let entries = journal.entries();
    let position = |prefix: &str| {
        entries
            .iter()
            .position(|e| e.starts_with(prefix))
            .unwrap_or_else(|| panic!("no `{prefix}` in {entries:?}"))
    };
    assert!(position("warn: Vue CLI is not installed") < position("run: npm install -g @vue/cli"));
    assert!(position("run: npm install -g @vue/cli") < position("run: vue create"));
}

#[test]
fn test_project_argument_parsing() {
    let spec = ProjectSpec::parse("flask-shop", ProjectFlags::default()).unwrap();
    assert_eq!(spec.kind(), ProjectKind::Flask);
    assert_eq!(spec.name(), "shop");
    assert!(ProjectSpec::parse("cobol-app", ProjectFlags::default()).is_err());
    assert!(Path::new(spec.name()).is_relative());
}
