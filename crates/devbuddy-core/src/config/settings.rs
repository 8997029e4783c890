//! Settings loaded from YAML, with environment variable overrides

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the plugin directory
pub const PLUGIN_DIR_ENV: &str = "DEVBUDDY_PLUGIN_DIR";
/// Environment variable overriding the subprocess timeout (seconds)
pub const COMMAND_TIMEOUT_ENV: &str = "DEVBUDDY_COMMAND_TIMEOUT";
/// Environment variable toggling automatic tool installation
pub const AUTO_INSTALL_ENV: &str = "DEVBUDDY_AUTO_INSTALL";

const APP_DIR: &str = "devbuddy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for plugins at start-up
    pub plugin_dir: PathBuf,

    /// Upper bound for generators, git and formatters
    pub command_timeout_secs: u64,

    /// Upper bound for package-manager installs
    pub install_timeout_secs: u64,

    /// Install missing framework CLIs instead of failing
    pub auto_install: bool,

    /// Clone URL used by `plugin install` when no `--url` is given; `{name}` is substituted
    pub plugin_url_template: String,

    /// Rhai operation budget per plugin call (0 = unlimited)
    pub plugin_operation_limit: u64,

    /// Echo subprocess output to the terminal
    pub stream_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugin_dir: default_plugin_dir(),
            command_timeout_secs: 600,
            install_timeout_secs: 300,
            auto_install: true,
            plugin_url_template: "https://github.com/devbuddy-plugins/{name}.git".to_string(),
            plugin_operation_limit: 5_000_000,
            stream_output: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields defaults; an explicit
    /// path that does not exist is an error. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(|var| std::env::var(var).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(PLUGIN_DIR_ENV).filter(|v| !v.is_empty()) {
            self.plugin_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(COMMAND_TIMEOUT_ENV) {
            self.command_timeout_secs =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: COMMAND_TIMEOUT_ENV,
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = lookup(AUTO_INSTALL_ENV) {
            self.auto_install = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: AUTO_INSTALL_ENV,
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    /// Clone URL for a plugin name
    pub fn plugin_url(&self, name: &str) -> String {
        self.plugin_url_template.replace("{name}", name)
    }
}

/// `<config dir>/devbuddy/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

fn default_plugin_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("plugins"))
        .unwrap_or_else(|| PathBuf::from(".devbuddy").join("plugins"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("command_timeout_secs: 30\nauto_install: false\n")
            .unwrap();
        assert_eq!(settings.command_timeout(), Duration::from_secs(30));
        assert!(!settings.auto_install);
        assert_eq!(settings.install_timeout_secs, 300);
        assert_eq!(settings.plugin_dir, default_plugin_dir());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (PLUGIN_DIR_ENV, "/opt/dbuddy/plugins"),
            (COMMAND_TIMEOUT_ENV, "45"),
            (AUTO_INSTALL_ENV, "off"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_env(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.plugin_dir, PathBuf::from("/opt/dbuddy/plugins"));
        assert_eq!(settings.command_timeout_secs, 45);
        assert!(!settings.auto_install);
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|var| (var == COMMAND_TIMEOUT_ENV).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(COMMAND_TIMEOUT_ENV));
    }

    #[test]
    fn test_plugin_url_substitutes_name() {
        let settings = Settings::default();
        assert_eq!(
            settings.plugin_url("lint"),
            "https://github.com/devbuddy-plugins/lint.git"
        );
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
