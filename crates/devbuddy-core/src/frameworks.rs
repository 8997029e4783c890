//! Global installs of framework CLIs for `dbuddy install <group>`
//!
//! These installs change the user's global npm, composer or pip environment.
//! Every package is announced through [`Progress::warn`] before it is installed.

use crate::error::{FrameworkError, PrerequisiteError};
use crate::progress::Progress;
use crate::runtime::check::{check_runtime, Runtime, COMPOSER, JAVA, NODE, NPM, PHP, PYTHON};
use crate::runtime::{Installer, Toolchain};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkGroup {
    Js,
    Php,
    Java,
    Python,
}

impl FrameworkGroup {
    pub const ALL: [FrameworkGroup; 4] = [
        FrameworkGroup::Js,
        FrameworkGroup::Php,
        FrameworkGroup::Java,
        FrameworkGroup::Python,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkGroup::Js => "js-frameworks",
            FrameworkGroup::Php => "php-frameworks",
            FrameworkGroup::Java => "java-frameworks",
            FrameworkGroup::Python => "python-frameworks",
        }
    }

    pub fn runtimes(&self) -> &'static [Runtime] {
        match self {
            FrameworkGroup::Js => &[NODE, NPM],
            FrameworkGroup::Php => &[PHP, COMPOSER],
            FrameworkGroup::Java => &[JAVA],
            FrameworkGroup::Python => &[PYTHON],
        }
    }

    /// Installer and packages; `None` when the group has nothing to install
    pub fn packages(&self) -> Option<(Installer, &'static [&'static str])> {
        match self {
            FrameworkGroup::Js => Some((
                Installer::NpmGlobal,
                &["@vue/cli", "create-react-app", "@angular/cli", "next"],
            )),
            FrameworkGroup::Php => Some((Installer::ComposerGlobal, &["laravel/installer"])),
            FrameworkGroup::Java => None,
            FrameworkGroup::Python => Some((
                Installer::Pip,
                &["flask", "django", "fastapi", "uvicorn", "pytest", "sphinx"],
            )),
        }
    }
}

impl fmt::Display for FrameworkGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkGroup {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| FrameworkError::UnknownGroup(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInstall {
    pub installed: Vec<&'static str>,
    /// Shown instead of installing, e.g. for Java
    pub note: Option<&'static str>,
}

/// Install every package of `group`, one at a time
pub async fn install_group<T: Toolchain, P: Progress>(
    toolchain: &T,
    progress: &P,
    group: FrameworkGroup,
    limit: Duration,
) -> Result<GroupInstall, FrameworkError> {
    let mut python = None;
    for runtime in group.runtimes() {
        let found = check_runtime(toolchain, runtime);
        if !found.present {
            return Err(PrerequisiteError::MissingRuntime {
                runtime: runtime.name,
                download_url: runtime.download_url,
            }
            .into());
        }
        if runtime == &PYTHON {
            python = Some(found.tool);
        }
    }

    let Some((installer, packages)) = group.packages() else {
        return Ok(GroupInstall {
            installed: Vec::new(),
            note: Some("Java frameworks like Spring Boot are set up per project with Maven or Gradle"),
        });
    };
    let python = python.as_deref().unwrap_or(crate::runtime::resolver::DEFAULT_PYTHON);

    progress.warn(&format!(
        "Installing {} globally with {}: {}",
        group,
        installer,
        packages.join(", ")
    ));

    let mut result = GroupInstall::default();
    for &package in packages {
        progress.start(&format!("Installing {}", package));
        let invocation = installer.invocation(&[package], python);
        if let Err(source) = toolchain.run(&invocation, limit).await {
            progress.stop(&format!("Installing {} failed", package));
            return Err(FrameworkError::Install { package, source });
        }
        tracing::info!(package, group = %group, "installed");
        progress.stop(&format!("Installed {}", package));
        result.installed.push(package);
    }
    Ok(result)
}
