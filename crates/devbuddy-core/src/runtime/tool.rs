//! Installable framework CLIs
//!
//! Auxiliary tools are installed into the user's global environment (pip or a
//! global npm/composer prefix). Callers announce that before calling
//! [`AuxiliaryTool::install`].

use super::process::{Invocation, Toolchain};
use crate::error::ProcessError;
use std::fmt;
use std::time::Duration;

/// Package manager used to install a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installer {
    /// `<python> -m pip install`
    Pip,
    /// `npm install -g`
    NpmGlobal,
    /// `composer global require`
    ComposerGlobal,
}

impl Installer {
    /// Build the install command; `python` is the resolved interpreter for pip
    pub fn invocation(&self, packages: &[&str], python: &str) -> Invocation {
        let base = match self {
            Installer::Pip => Invocation::new(python).args(["-m", "pip", "install"]),
            Installer::NpmGlobal => Invocation::new("npm").args(["install", "-g"]),
            Installer::ComposerGlobal => Invocation::new("composer").args(["global", "require"]),
        };
        base.args(packages.iter().copied())
    }
}

impl fmt::Display for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Installer::Pip => f.write_str("pip"),
            Installer::NpmGlobal => f.write_str("npm"),
            Installer::ComposerGlobal => f.write_str("composer"),
        }
    }
}

/// A framework CLI the scaffold needs and may install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxiliaryTool {
    /// Display name for user-facing messages
    pub name: &'static str,
    /// Executable expected on PATH after install
    pub program: &'static str,
    pub installer: Installer,
    pub packages: &'static [&'static str],
}

impl AuxiliaryTool {
    pub const fn new(
        name: &'static str,
        program: &'static str,
        installer: Installer,
        packages: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            program,
            installer,
            packages,
        }
    }

    pub fn install_invocation(&self, python: &str) -> Invocation {
        self.installer.invocation(self.packages, python)
    }

    /// The install command as the user would type it
    pub fn install_command(&self, python: &str) -> String {
        self.install_invocation(python).to_string()
    }

    /// Run the installer; does not re-check PATH
    pub async fn install<T: Toolchain>(
        &self,
        toolchain: &T,
        python: &str,
        limit: Duration,
    ) -> Result<(), ProcessError> {
        let invocation = self.install_invocation(python);
        tracing::info!(tool = self.program, command = %invocation, "installing");
        toolchain.run(&invocation, limit).await
    }
}
