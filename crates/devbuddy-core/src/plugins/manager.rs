//! Installing, updating and removing plugins
//!
//! A plugin is installed either from a `.zip` archive served over HTTP(S) or
//! by cloning a git repository. A freshly installed plugin must load and
//! register; if it does not, its directory is removed again.

use super::discovery::{is_reserved, PluginDescriptor};
use super::loader::{PluginLoader, RegistrationSummary};
use crate::config::Settings;
use crate::error::PluginError;
use crate::progress::Progress;
use crate::registry::CapabilityRegistry;
use crate::runtime::{Invocation, Toolchain};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use url::Url;
use zip::ZipArchive;

/// Where a plugin is installed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// A zip archive downloaded over HTTP(S)
    Archive(Url),
    /// Anything `git clone` accepts
    Git(String),
}

impl PluginSource {
    pub fn parse(url: &str) -> Result<Self, PluginError> {
        let is_http = url.starts_with("http://") || url.starts_with("https://");
        if is_http && url.split(['?', '#']).next().unwrap_or(url).ends_with(".zip") {
            let parsed = Url::parse(url).map_err(|source| PluginError::InvalidUrl {
                url: url.to_string(),
                source,
            })?;
            return Ok(Self::Archive(parsed));
        }
        if is_http {
            // Validate, but hand git the original spelling
            Url::parse(url).map_err(|source| PluginError::InvalidUrl {
                url: url.to_string(),
                source,
            })?;
        }
        Ok(Self::Git(url.to_string()))
    }
}

pub fn is_valid_plugin_name(name: &str) -> bool {
    !name.is_empty()
        && !is_reserved(name)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Upper bound on establishing a connection to a plugin host
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PluginManager {
    root: PathBuf,
    url_template: String,
    command_timeout: Duration,
    client: reqwest::Client,
}

impl PluginManager {
    /// `command_timeout` bounds both `git` and the whole archive download
    pub fn new(root: impl Into<PathBuf>, url_template: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            url_template: url_template.into(),
            command_timeout,
            client: reqwest::Client::builder()
                .user_agent(concat!("devbuddy/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(CONNECT_TIMEOUT.min(command_timeout))
                .timeout(command_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.plugin_dir.clone(),
            settings.plugin_url_template.clone(),
            settings.command_timeout(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a plugin lives in; validates the name
    pub fn plugin_path(&self, name: &str) -> Result<PathBuf, PluginError> {
        if !is_valid_plugin_name(name) {
            return Err(PluginError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// The explicit URL, or the configured default for `name`
    pub fn resolve_source(&self, name: &str, url: Option<&str>) -> Result<PluginSource, PluginError> {
        match url {
            Some(url) => PluginSource::parse(url),
            None => PluginSource::parse(&self.url_template.replace("{name}", name)),
        }
    }

    /// Fetch a plugin, then load and register it.
    ///
    /// On any failure after the directory was created it is removed again.
    pub async fn install<T, P>(
        &self,
        toolchain: &T,
        progress: &P,
        name: &str,
        url: Option<&str>,
        loader: &mut PluginLoader,
        registry: &mut CapabilityRegistry,
    ) -> Result<RegistrationSummary, PluginError>
    where
        T: Toolchain,
        P: Progress,
    {
        let target = self.plugin_path(name)?;
        if target.exists() {
            return Err(PluginError::AlreadyInstalled {
                name: name.to_string(),
                path: target,
            });
        }
        let source = self.resolve_source(name, url)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| PluginError::Io {
                path: self.root.clone(),
                source,
            })?;

        progress.start(&format!("Installing plugin {}...", name));
        let result = self
            .fetch_and_register(toolchain, name, &source, &target, loader, registry)
            .await;

        match result {
            Ok(summary) => {
                progress.stop(&format!("Plugin {} installed", name));
                tracing::info!(plugin = name, commands = summary.commands.len(), "plugin installed");
                Ok(summary)
            }
            Err(e) => {
                progress.stop(&format!("Installing plugin {} failed", name));
                if target.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&target).await {
                        tracing::warn!(path = %target.display(), error = %cleanup, "could not remove failed plugin");
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_and_register<T: Toolchain>(
        &self,
        toolchain: &T,
        name: &str,
        source: &PluginSource,
        target: &Path,
        loader: &mut PluginLoader,
        registry: &mut CapabilityRegistry,
    ) -> Result<RegistrationSummary, PluginError> {
        match source {
            PluginSource::Archive(url) => {
                let bytes = self.download(url).await?;
                let written = extract_archive(&bytes, target)?;
                tracing::debug!(plugin = name, files = written, "archive extracted");
            }
            PluginSource::Git(url) => {
                let clone = Invocation::new("git")
                    .args(["clone", "--depth", "1"])
                    .arg(url.as_str())
                    .arg(target.to_string_lossy());
                toolchain.run(&clone, self.command_timeout).await?;
            }
        }

        let descriptor = PluginDescriptor::new(name, target);
        let loaded = loader.load(&descriptor)?;
        Ok(loader.register_into(&loaded, registry)?)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, PluginError> {
        let download_err = |source: reqwest::Error| {
            if source.is_timeout() {
                PluginError::DownloadTimedOut {
                    url: url.to_string(),
                    limit: self.command_timeout,
                }
            } else {
                PluginError::Download {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(download_err)?;

        if !response.status().is_success() {
            return Err(PluginError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await.map_err(download_err)?.to_vec())
    }

    /// `git pull` inside an installed plugin
    pub async fn update<T: Toolchain>(&self, toolchain: &T, name: &str) -> Result<(), PluginError> {
        let target = self.plugin_path(name)?;
        if !target.is_dir() {
            return Err(PluginError::NotInstalled(name.to_string()));
        }
        let pull = Invocation::new("git").arg("pull").current_dir(&target);
        toolchain.run(&pull, self.command_timeout).await?;
        tracing::info!(plugin = name, "plugin updated");
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<PathBuf, PluginError> {
        let target = self.plugin_path(name)?;
        if !target.is_dir() {
            return Err(PluginError::NotInstalled(name.to_string()));
        }
        fs::remove_dir_all(&target)
            .await
            .map_err(|source| PluginError::Io {
                path: target.clone(),
                source,
            })?;
        tracing::info!(plugin = name, "plugin removed");
        Ok(target)
    }
}

/// Extract a plugin archive into `dest`, returning the number of files written.
///
/// A single top-level directory shared by every entry (as in GitHub archives)
/// is stripped. Entries that would escape `dest` are ignored.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize, PluginError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        match file.enclosed_name() {
            Some(path) => entries.push((i, path, file.is_dir())),
            None => tracing::warn!(entry = file.name(), "skipping unsafe archive entry"),
        }
    }

    let prefix = common_root(entries.iter().map(|(_, path, is_dir)| (path.as_path(), *is_dir)));

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| PluginError::Io { path, source }
    };

    let mut written = 0;
    for (index, path, is_dir) in entries {
        let relative = match &prefix {
            Some(prefix) => path.strip_prefix(prefix).unwrap_or(path.as_path()).to_path_buf(),
            None => path.clone(),
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out = dest.join(&relative);
        if is_dir {
            std::fs::create_dir_all(&out).map_err(io_err(&out))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let mut file = archive.by_index(index)?;
        let mut target = std::fs::File::create(&out).map_err(io_err(&out))?;
        std::io::copy(&mut file, &mut target).map_err(io_err(&out))?;
        written += 1;
    }

    Ok(written)
}

/// The one directory every entry lives under, if there is one
fn common_root<'a>(entries: impl Iterator<Item = (&'a Path, bool)>) -> Option<PathBuf> {
    let mut root: Option<PathBuf> = None;
    for (path, is_dir) in entries {
        let mut components = path.components();
        let first = match components.next() {
            Some(Component::Normal(first)) => PathBuf::from(first),
            _ => return None,
        };
        // A file directly at the top level means there is no wrapper directory
        if components.next().is_none() && !is_dir {
            return None;
        }
        match &root {
            Some(existing) if *existing != first => return None,
            Some(_) => {}
            None => root = Some(first),
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use crate::testing::FakeToolchain;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (path, content) in files {
                zip.start_file(*path, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_source_selection() {
        assert!(matches!(
            PluginSource::parse("https://example.com/p/lint.zip?token=1").unwrap(),
            PluginSource::Archive(_)
        ));
        assert_eq!(
            PluginSource::parse("git@github.com:me/lint.git").unwrap(),
            PluginSource::Git("git@github.com:me/lint.git".to_string())
        );
        assert!(PluginSource::parse("https://exa mple.com/x.git").is_err());
    }

    #[test]
    fn test_plugin_names() {
        assert!(is_valid_plugin_name("system-tools"));
        assert!(!is_valid_plugin_name("../escape"));
        assert!(!is_valid_plugin_name("__cache"));
        assert!(!is_valid_plugin_name(".hidden"));
    }

    #[test]
    fn test_extract_strips_wrapper_directory() {
        let bytes = zip_of(&[
            ("lint-main/plugin.rhai", "fn register_commands(r) {}"),
            ("lint-main/lib/util.rhai", ""),
        ]);
        let dest = tempfile::tempdir().unwrap();
        let written = extract_archive(&bytes, dest.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dest.path().join("plugin.rhai").is_file());
        assert!(dest.path().join("lib/util.rhai").is_file());
    }

    #[test]
    fn test_extract_flat_archive() {
        let bytes = zip_of(&[("plugin.rhai", ""), ("plugin.yaml", "")]);
        let dest = tempfile::tempdir().unwrap();
        extract_archive(&bytes, dest.path()).unwrap();
        assert!(dest.path().join("plugin.rhai").is_file());
        assert!(dest.path().join("plugin.yaml").is_file());
    }

    #[tokio::test]
    async fn test_git_install_registers_commands() {
        let root = tempfile::tempdir().unwrap();
        let manager = PluginManager::new(root.path(), "https://example.com/{name}.git", Duration::from_secs(5));
        let toolchain = FakeToolchain::new().with_tools(["git"]).creates_file(
            "git",
            "lint/plugin.rhai",
            r#"fn register_commands(r) { r.command("lint", Fn("lint")); } fn lint(args) {}"#,
        ).in_dir(root.path());

        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let summary = manager
            .install(&toolchain, &SilentProgress, "lint", None, &mut loader, &mut registry)
            .await
            .unwrap();

        assert_eq!(summary.commands, ["lint"]);
        assert_eq!(
            toolchain.invocations()[0].to_string(),
            format!(
                "git clone --depth 1 https://example.com/lint.git {}",
                root.path().join("lint").display()
            )
        );
    }

    #[tokio::test]
    async fn test_failed_registration_removes_plugin_dir() {
        let root = tempfile::tempdir().unwrap();
        let manager = PluginManager::new(root.path(), "https://example.com/{name}.git", Duration::from_secs(5));
        let toolchain = FakeToolchain::new()
            .with_tools(["git"])
            .creates_file("git", "bad/plugin.rhai", "fn nothing() {}")
            .in_dir(root.path());

        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let err = manager
            .install(&toolchain, &SilentProgress, "bad", None, &mut loader, &mut registry)
            .await
            .unwrap_err();

        assert!(matches!(err, PluginError::Load(_)));
        assert!(!root.path().join("bad").exists());
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        // accepted by the kernel backlog, never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/lint.zip", listener.local_addr().unwrap());
        let root = tempfile::tempdir().unwrap();
        let manager = PluginManager::new(root.path(), "{name}", Duration::from_millis(300));

        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let err = manager
            .install(
                &FakeToolchain::new(),
                &SilentProgress,
                "lint",
                Some(&url),
                &mut loader,
                &mut registry,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PluginError::DownloadTimedOut { .. }), "{err}");
        assert!(!root.path().join("lint").exists());
        drop(listener);
    }

    #[tokio::test]
    async fn test_install_refuses_existing_plugin() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("lint")).unwrap();
        let manager = PluginManager::new(root.path(), "{name}", Duration::from_secs(5));
        let toolchain = FakeToolchain::new();
        let err = manager
            .install(
                &toolchain,
                &SilentProgress,
                "lint",
                None,
                &mut PluginLoader::default(),
                &mut CapabilityRegistry::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::AlreadyInstalled { .. }));
    }

    #[tokio::test]
    async fn test_remove() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("lint")).unwrap();
        let manager = PluginManager::new(root.path(), "{name}", Duration::from_secs(5));

        manager.remove("lint").await.unwrap();
        assert!(!root.path().join("lint").exists());

        let err = manager.remove("lint").await.unwrap_err();
        assert!(matches!(err, PluginError::NotInstalled(_)));
    }
}
