//! Interactive `dbuddy create` flow

use super::progress::ClackProgress;
use super::report::print_stage_results;
use crate::config::Settings;
use crate::project::{ProjectFlags, ProjectKind, ProjectSpec};
use crate::runtime::Toolchain;
use crate::scaffold::{self, ScaffoldReport};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// `<type>-<name>`, e.g. `flask-app`; prompted for when absent
    pub project: Option<String>,

    /// Project directory; defaults to `./<name>`
    pub directory: Option<PathBuf>,

    pub flags: ProjectFlags,

    /// Fail instead of installing missing framework CLIs
    pub no_install: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the create flow with interactive prompts
pub async fn run<T: Toolchain>(
    toolchain: &T,
    settings: &Settings,
    args: CreateArgs,
) -> Result<ScaffoldReport> {
    cliclack::intro("devbuddy")?;

    // Step 1: Project kind and name
    let spec = select_project(&args)?;
    cliclack::log::info(format!(
        "Creating {} project: {}",
        spec.kind().display_name(),
        spec.name()
    ))?;
    describe_flags(spec.flags())?;

    // Step 2: Target directory
    let project_dir = select_directory(&args, spec.name())?;

    // Step 3: Prerequisites and stages
    let mut settings = settings.clone();
    if args.no_install {
        settings.auto_install = false;
    }
    let progress = ClackProgress::for_settings(&settings);
    let report = scaffold::scaffold(&spec, &project_dir, toolchain, &progress, &settings)
        .await
        .with_context(|| format!("Cannot create {} project", spec.kind().display_name()))?;
    drop(progress);

    // Step 4: Results
    print_stage_results(&report)?;
    if report.outcome.success {
        print_next_steps(&spec, &project_dir)?;
    } else {
        cliclack::outro_cancel("Project was not created")?;
    }

    Ok(report)
}

fn select_project(args: &CreateArgs) -> Result<ProjectSpec> {
    if let Some(project) = &args.project {
        return Ok(ProjectSpec::parse(project, args.flags)?);
    }
    if args.yes {
        anyhow::bail!("A project argument such as `flask-app` is required with --yes");
    }

    let mut select = cliclack::select("Project type");
    for kind in ProjectKind::ALL {
        select = select.item(kind, kind.display_name(), kind.as_str());
    }
    let kind: ProjectKind = select.interact()?;

    let name: String = cliclack::input("Project name")
        .placeholder("my-app")
        .validate(|input: &String| {
            if ProjectSpec::new(input.as_str(), ProjectKind::Python, ProjectFlags::default()).is_ok() {
                Ok(())
            } else {
                Err("Use letters, digits, '-', '_' or '.'")
            }
        })
        .interact()?;

    Ok(ProjectSpec::new(name, kind, args.flags)?)
}

fn describe_flags(flags: ProjectFlags) -> Result<()> {
    let extras: Vec<&str> = [
        (flags.dockerize, "Docker support"),
        (flags.git_init, "git initialization"),
        (flags.with_tests, "testing framework"),
        (flags.auto_ci, "CI/CD configuration"),
    ]
    .into_iter()
    .filter_map(|(on, label)| on.then_some(label))
    .collect();

    if !extras.is_empty() {
        cliclack::log::info(format!("With {}", extras.join(", ")))?;
    }
    Ok(())
}

fn select_directory(args: &CreateArgs, name: &str) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let path = match &args.directory {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => current_dir.join(dir),
        None => current_dir.join(name),
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    // Existing files are kept; say so before anything runs
    if path.is_dir() {
        let count = std::fs::read_dir(&path).map(|e| e.count()).unwrap_or(0);
        if count > 0 {
            cliclack::log::warning(format!(
                "{} already has {} items; existing files will not be overwritten",
                path.display(),
                count
            ))?;

            let confirm = if args.yes {
                true
            } else {
                cliclack::confirm("Continue anyway?")
                    .initial_value(true)
                    .interact()?
            };

            if !confirm {
                anyhow::bail!("Setup cancelled.");
            }
        }
    }

    Ok(path)
}

fn print_next_steps(spec: &ProjectSpec, project_dir: &Path) -> Result<()> {
    let steps = spec.next_steps(project_dir);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}
