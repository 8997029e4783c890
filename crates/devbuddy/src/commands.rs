//! Subcommand handlers. Each returns the process exit code.

use crate::{App, PluginCommand, SetupEnvArgs, UpdateDepsArgs};
use anyhow::{Context as _, Result};
use colored::Colorize;
use devbuddy_core::analysis;
use devbuddy_core::dependencies::{self, DependencyRequest};
use devbuddy_core::docs::{self, DocsRequest};
use devbuddy_core::environment::{self, EnvRequest};
use devbuddy_core::formatter::{self, FormatRequest};
use devbuddy_core::frameworks::{self, FrameworkGroup};
use devbuddy_core::templates::generate::{self, Generated};
use devbuddy_core::tui::{self, print_plugin_report, ClackProgress, CreateArgs};
use devbuddy_core::{PluginManager, Progress, SystemToolchain};
use std::path::Path;

fn toolchain(app: &App) -> SystemToolchain {
    SystemToolchain::new(app.settings.stream_output)
}

pub async fn create(app: &App, args: CreateArgs) -> Result<i32> {
    let report = tui::run(&toolchain(app), &app.settings, args).await?;
    Ok(if report.outcome.success { 0 } else { 1 })
}

pub async fn plugin(app: &mut App, command: PluginCommand) -> Result<i32> {
    let manager = PluginManager::from_settings(&app.settings);
    match command {
        PluginCommand::List => {
            cliclack::intro(format!("Plugins in {}", manager.root().display()))?;
            print_plugin_report(&app.plugins)?;
            cliclack::outro(format!("{} registered", app.plugins.registered().count()))?;
        }
        PluginCommand::Install {
            name,
            update: true,
            ..
        } => {
            let progress = ClackProgress::for_settings(&app.settings);
            progress.start(&format!("Updating plugin {}...", name));
            manager.update(&toolchain(app), &name).await?;
            progress.stop(&format!("Plugin {} updated", name));
        }
        PluginCommand::Install { name, url, .. } => {
            let progress = ClackProgress::for_settings(&app.settings);
            let summary = manager
                .install(
                    &toolchain(app),
                    &progress,
                    &name,
                    url.as_deref(),
                    &mut app.loader,
                    &mut app.registry,
                )
                .await
                .with_context(|| format!("Failed to install plugin {}", name))?;
            drop(progress);
            if summary.commands.is_empty() {
                cliclack::log::warning(format!("Plugin {} registered no commands", name))?;
            } else {
                cliclack::log::success(format!(
                    "Plugin {} adds: {}",
                    name,
                    summary.commands.join(", ")
                ))?;
            }
        }
        PluginCommand::Remove { name } => {
            let path = manager.remove(&name).await?;
            cliclack::log::success(format!("Removed {}", path.display()))?;
        }
    }
    Ok(0)
}

pub fn list_commands(app: &App) -> Result<i32> {
    let width = app.registry.names().map(str::len).max().unwrap_or(0);
    for capability in app.registry.list_all() {
        let owner = if capability.is_builtin() {
            capability.owner().dimmed()
        } else {
            capability.owner().cyan()
        };
        println!(
            "  {:<width$}  {:<12} {}",
            capability.name().bold(),
            owner,
            capability.description(),
            width = width
        );
    }
    Ok(0)
}

pub async fn format(app: &App, args: crate::FormatArgs) -> Result<i32> {
    let request = FormatRequest {
        path: args.path,
        tool: args.tool,
        use_git: args.git,
        recursive: args.recursive,
    };
    let progress = ClackProgress::for_settings(&app.settings);
    let summary = formatter::format_code(&toolchain(app), &progress, &app.settings, &request).await?;
    drop(progress);
    cliclack::log::success(format!(
        "Formatted {} files with {}",
        summary.files.len(),
        summary.tool
    ))?;
    Ok(0)
}

pub async fn install(app: &App, group: FrameworkGroup) -> Result<i32> {
    cliclack::intro(format!("Installing {}", group))?;
    let progress = ClackProgress::for_settings(&app.settings);
    let result = frameworks::install_group(
        &toolchain(app),
        &progress,
        group,
        app.settings.install_timeout(),
    )
    .await?;
    drop(progress);

    if let Some(note) = result.note {
        cliclack::log::info(note)?;
    }
    cliclack::outro(format!("{} packages installed", result.installed.len()))?;
    Ok(0)
}

pub async fn generate(template: Generated, lang: Option<&str>) -> Result<i32> {
    let ecosystem = match lang {
        Some(lang) => {
            let parsed = generate::parse_lang(lang);
            if parsed.is_none() {
                cliclack::log::warning(format!(
                    "No {} template for {}; using the generic one",
                    template, lang
                ))?;
            }
            parsed
        }
        None => None,
    };

    let dir = std::env::current_dir().context("Cannot read the current directory")?;
    let artifact = generate::generate(template, ecosystem, &dir).await?;
    if artifact.is_created() {
        cliclack::log::success(format!("Generated {}", template.file_name()))?;
    } else {
        cliclack::log::remark(format!(
            "{} already exists; left unchanged",
            template.file_name()
        ))?;
    }
    Ok(0)
}

pub async fn analyze(app: &App, path: &Path) -> Result<i32> {
    // pylint's report is the output, so it always goes to the terminal
    let progress = ClackProgress::new(false);
    let summary =
        analysis::analyze_code(&SystemToolchain::new(true), &progress, &app.settings, path).await?;
    drop(progress);
    if summary.issues_found {
        cliclack::log::warning(format!("pylint reported issues in {}", path.display()))?;
    } else {
        cliclack::log::success(format!("No issues found in {}", path.display()))?;
    }
    Ok(0)
}

pub async fn docs(app: &App, package: String, author: Option<String>) -> Result<i32> {
    let request = DocsRequest {
        package,
        author,
        root: std::env::current_dir().context("Cannot read the current directory")?,
    };
    let progress = ClackProgress::for_settings(&app.settings);
    let summary = docs::init_docs(&toolchain(app), &progress, &app.settings, &request).await?;
    drop(progress);
    if summary.artifact.is_created() {
        cliclack::log::success(format!("Documentation created in {}", summary.artifact.path.display()))?;
    } else {
        cliclack::log::remark(format!(
            "{} already exists; left unchanged",
            summary.artifact.path.display()
        ))?;
    }
    cliclack::log::info(format!("To build: {}", summary.build_hint))?;
    Ok(0)
}

pub async fn update_deps(app: &App, args: UpdateDepsArgs) -> Result<i32> {
    let request = DependencyRequest {
        path: args.path,
        manager: args.package_manager,
        only_outdated: args.only_outdated,
    };
    let plan = dependencies::plan(&toolchain(app), &request)?;

    let heading = if request.only_outdated { "Outdated" } else { "Installed" };
    cliclack::intro(format!("{} {} packages", heading, plan.manager))?;
    // The report is the output, so it always goes to the terminal
    dependencies::report_dependencies(&SystemToolchain::new(true), &app.settings, &plan).await?;

    let upgrade = args.yes
        || cliclack::confirm(format!("Run `{}`?", plan.upgrade))
            .initial_value(false)
            .interact()?;
    if !upgrade {
        cliclack::outro("Dependencies left unchanged")?;
        return Ok(0);
    }

    let progress = ClackProgress::for_settings(&app.settings);
    dependencies::upgrade_dependencies(&toolchain(app), &progress, &app.settings, &plan).await?;
    drop(progress);
    cliclack::outro(format!("{} dependencies upgraded", plan.manager))?;
    Ok(0)
}

pub async fn setup_env(app: &App, args: SetupEnvArgs) -> Result<i32> {
    let request = EnvRequest {
        kind: args.kind,
        path: args.path,
        install_deps: args.install_deps,
    };
    cliclack::intro(format!("Setting up a {} environment", request.kind))?;
    let progress = ClackProgress::for_settings(&app.settings);
    let setup = environment::setup_env(&toolchain(app), &progress, &app.settings, &request).await?;
    drop(progress);

    for artifact in &setup.artifacts {
        if !artifact.is_created() {
            cliclack::log::remark(format!("{} already exists; left unchanged", artifact.path.display()))?;
        }
    }
    for step in &setup.next_steps {
        cliclack::log::info(step)?;
    }
    cliclack::outro(format!("{} environment ready in {}", request.kind, request.path.display()))?;
    Ok(0)
}

/// Run a command contributed by a plugin
pub fn external(app: &App, argv: &[String]) -> Result<i32> {
    let Some((name, args)) = argv.split_first() else {
        anyhow::bail!("No command given");
    };

    match app.registry.lookup(name) {
        Some(capability) if !capability.is_builtin() => {
            tracing::debug!(command = %name, plugin = capability.owner(), "dispatching");
            capability
                .invoke(args)
                .with_context(|| format!("Command `{}` from plugin {} failed", name, capability.owner()))?;
            Ok(0)
        }
        _ => {
            eprintln!(
                "{} unknown command `{}`. Run `dbuddy commands` to see what is available.",
                "error:".red().bold(),
                name
            );
            Ok(2)
        }
    }
}
