//! dbuddy - Automate your coding tasks

mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use devbuddy_core::dependencies::PackageManager;
use devbuddy_core::environment::EnvKind;
use devbuddy_core::formatter::FormatTool;
use devbuddy_core::frameworks::FrameworkGroup;
use devbuddy_core::templates::generate::Generated;
use devbuddy_core::tui::CreateArgs;
use devbuddy_core::{Capability, CapabilityRegistry, PluginLoader, ProjectFlags, Settings};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dbuddy")]
#[command(about = "DevBuddy - scaffold projects, set up environments and tooling, keep code tidy, and run plugin commands")]
#[command(version)]
#[command(allow_external_subcommands = true)]
pub struct Args {
    /// Path to config.yaml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project (e.g. dbuddy create flask-app --dockerize)
    Create(CliCreateArgs),
    /// Manage plugins
    #[command(subcommand)]
    Plugin(PluginCommand),
    /// List every registered command and where it comes from
    Commands,
    /// Format Python code with black, autopep8, yapf or isort
    Format(FormatArgs),
    /// Install frameworks for a language (e.g. dbuddy install js-frameworks)
    Install {
        /// js-frameworks, php-frameworks, java-frameworks or python-frameworks
        group: FrameworkGroup,
    },
    /// Generate a common project file from a template
    Generate {
        /// gitignore, dockerfile, readme or license
        template: Generated,

        /// Language for the template (e.g. python, node, java)
        #[arg(long)]
        lang: Option<String>,
    },
    /// Analyze Python code with pylint
    Analyze {
        /// Directory or file to analyze
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Create Sphinx documentation for a package
    Docs {
        package: String,

        /// Author shown in the docs (defaults to git's user.name)
        #[arg(long)]
        author: Option<String>,
    },
    /// Show and upgrade project dependencies
    #[command(name = "update-deps")]
    UpdateDeps(UpdateDepsArgs),
    /// Set up a development environment in an existing directory
    #[command(name = "setup-env")]
    SetupEnv(SetupEnvArgs),
    /// Plugin command
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(ClapArgs, Debug)]
pub struct CliCreateArgs {
    /// <type>-<name>, e.g. flask-app; prompted for when omitted
    pub project: Option<String>,

    /// Create the project with Docker support
    #[arg(long)]
    pub dockerize: bool,

    /// Initialize a git repository
    #[arg(long = "git-init")]
    pub git_init: bool,

    /// Set up a testing framework
    #[arg(long = "with-tests")]
    pub with_tests: bool,

    /// Create a CI/CD workflow
    #[arg(long = "auto-ci")]
    pub auto_ci: bool,

    /// Project directory to create (defaults to ./<name>)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Fail instead of installing missing framework CLIs
    #[arg(long = "no-install")]
    pub no_install: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            project: args.project,
            directory: args.directory,
            flags: ProjectFlags {
                dockerize: args.dockerize,
                git_init: args.git_init,
                with_tests: args.with_tests,
                auto_ci: args.auto_ci,
            },
            no_install: args.no_install,
            yes: args.yes,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// List installed plugins and whether they loaded
    List,
    /// Install a plugin from a git repository or a .zip archive
    Install {
        name: String,

        /// Source URL (defaults to the configured plugin URL template)
        #[arg(long)]
        url: Option<String>,

        /// Pull the latest changes for an installed plugin instead
        #[arg(long)]
        update: bool,
    },
    /// Remove an installed plugin
    Remove { name: String },
}

#[derive(ClapArgs, Debug)]
pub struct FormatArgs {
    /// File or directory to format
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Formatting tool to use
    #[arg(long, default_value = "black")]
    pub tool: FormatTool,

    /// Format only git-modified files
    #[arg(long)]
    pub git: bool,

    /// Format files in subdirectories
    #[arg(long)]
    pub recursive: bool,
}

#[derive(ClapArgs, Debug)]
pub struct UpdateDepsArgs {
    /// Project directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// pip, npm or composer (detected from the manifests when omitted)
    #[arg(long = "package-manager")]
    pub package_manager: Option<PackageManager>,

    /// List only outdated packages
    #[arg(long = "only-outdated")]
    pub only_outdated: bool,

    /// Upgrade without asking
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SetupEnvArgs {
    /// python, node, laravel, react, vue or django
    pub kind: EnvKind,

    /// Directory to set up
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Install dependencies from the project's manifest
    #[arg(long = "install-deps")]
    pub install_deps: bool,
}

/// Commands the binary dispatches itself; plugins cannot take these names
const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("create", "Create a new project"),
    ("plugin", "Manage plugins"),
    ("commands", "List registered commands"),
    ("format", "Format Python code"),
    ("install", "Install framework tooling"),
    ("generate", "Generate a common project file"),
    ("analyze", "Analyze Python code"),
    ("docs", "Create Sphinx documentation"),
    ("update-deps", "Show and upgrade dependencies"),
    ("setup-env", "Set up a development environment"),
    ("help", "Show help"),
];

/// Everything set up before dispatch
pub struct App {
    pub settings: Settings,
    pub registry: CapabilityRegistry,
    pub loader: PluginLoader,
    pub plugins: devbuddy_core::LoadReport,
}

fn bootstrap(config: Option<&std::path::Path>) -> Result<App> {
    let settings = Settings::load(config).context("Failed to load configuration")?;

    let mut registry = CapabilityRegistry::new();
    for (name, description) in BUILTIN_COMMANDS {
        registry.register(Capability::builtin(*name, *description))?;
    }

    // Plugins load once, before any command runs
    let mut loader = PluginLoader::from_settings(&settings);
    let plugins = loader.load_all(&settings.plugin_dir, &mut registry);
    for failure in plugins.failures() {
        tracing::warn!(plugin = %failure.name, status = %failure.status, "plugin skipped");
    }

    Ok(App {
        settings,
        registry,
        loader,
        plugins,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully; children in our process group get the signal too
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    logging::init(args.verbose);

    let mut app = bootstrap(args.config.as_deref())?;

    let result = match args.command {
        Some(Command::Create(create_args)) => commands::create(&app, create_args.into()).await,
        None => commands::create(&app, CreateArgs::default()).await,
        Some(Command::Plugin(command)) => commands::plugin(&mut app, command).await,
        Some(Command::Commands) => commands::list_commands(&app),
        Some(Command::Format(format_args)) => commands::format(&app, format_args).await,
        Some(Command::Install { group }) => commands::install(&app, group).await,
        Some(Command::Generate { template, lang }) => {
            commands::generate(template, lang.as_deref()).await
        }
        Some(Command::Analyze { path }) => commands::analyze(&app, &path).await,
        Some(Command::Docs { package, author }) => commands::docs(&app, package, author).await,
        Some(Command::UpdateDeps(deps_args)) => commands::update_deps(&app, deps_args).await,
        Some(Command::SetupEnv(env_args)) => commands::setup_env(&app, env_args).await,
        Some(Command::External(argv)) => commands::external(&app, &argv),
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    }
}
