//! Plugin loading and registration
//!
//! Each plugin runs in its own engine with its own compiled script, so one
//! plugin's syntax error, failing initialisation or bad registration cannot
//! affect another. [`PluginLoader::load_all`] turns every per-plugin failure
//! into a [`PluginOutcome`] instead of propagating it.

use super::discovery::{discover, PluginDescriptor};
use super::manifest::PluginManifest;
use super::script::{build_engine, handler_exists, RegistrationFacade, ScriptHandler};
use super::version::{check_compatibility, HOST_VERSION};
use crate::config::Settings;
use crate::error::{DuplicateCapability, LoadError, RegistrationError};
use crate::registry::{is_valid_command_name, Capability, CapabilityRegistry};
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Function every plugin must define
pub const REGISTRATION_FN: &str = "register_commands";

/// A compiled, initialised plugin ready to register its commands
pub struct LoadedPlugin {
    pub name: String,
    pub location: PathBuf,
    pub manifest: Option<PluginManifest>,
    engine: Rc<Engine>,
    ast: Rc<AST>,
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

/// Commands a plugin added to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub plugin: String,
    pub commands: Vec<String>,
}

#[derive(Debug)]
pub enum PluginStatus {
    Registered { commands: Vec<String> },
    /// Directory without an entry point
    NotLoadable,
    LoadFailed(LoadError),
    RegistrationFailed(RegistrationError),
}

impl PluginStatus {
    pub fn is_registered(&self) -> bool {
        matches!(self, PluginStatus::Registered { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PluginStatus::LoadFailed(_) | PluginStatus::RegistrationFailed(_)
        )
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginStatus::Registered { commands } if commands.is_empty() => {
                f.write_str("loaded (no commands)")
            }
            PluginStatus::Registered { commands } => write!(f, "loaded: {}", commands.join(", ")),
            PluginStatus::NotLoadable => write!(f, "no {}", super::manifest::ENTRY_POINT),
            PluginStatus::LoadFailed(e) => write!(f, "failed to load: {}", e),
            PluginStatus::RegistrationFailed(e) => write!(f, "failed to register: {}", e),
        }
    }
}

/// Result of one plugin's discover/load/register attempt
#[derive(Debug)]
pub struct PluginOutcome {
    pub name: String,
    pub location: PathBuf,
    pub manifest: Option<PluginManifest>,
    pub status: PluginStatus,
}

/// One entry per discovered plugin, in discovery order
#[derive(Debug, Default)]
pub struct LoadReport {
    pub outcomes: Vec<PluginOutcome>,
}

impl LoadReport {
    pub fn registered(&self) -> impl Iterator<Item = &PluginOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_registered())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PluginOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    pub fn get(&self, name: &str) -> Option<&PluginOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Loads plugins and keeps the exports they publish for later plugins
pub struct PluginLoader {
    operation_limit: u64,
    host_version: String,
    exports: BTreeMap<String, Dynamic>,
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new(Settings::default().plugin_operation_limit)
    }
}

impl PluginLoader {
    pub fn new(operation_limit: u64) -> Self {
        Self {
            operation_limit,
            host_version: HOST_VERSION.to_string(),
            exports: BTreeMap::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.plugin_operation_limit)
    }

    /// Check manifests against another host version
    pub fn with_host_version(mut self, version: impl Into<String>) -> Self {
        self.host_version = version.into();
        self
    }

    /// Value a registered plugin returned from `register_commands`
    pub fn exports(&self, plugin: &str) -> Option<&Dynamic> {
        self.exports.get(plugin)
    }

    /// Compile and initialise a plugin, validating its contract
    pub fn load(&self, descriptor: &PluginDescriptor) -> Result<LoadedPlugin, LoadError> {
        if !descriptor.loadable {
            return Err(LoadError::MissingEntryPoint {
                path: descriptor.entry_point(),
            });
        }

        let manifest = PluginManifest::read(&descriptor.location)?;
        if let Some(requirement) = manifest.as_ref().and_then(|m| m.requires.as_deref()) {
            check_compatibility(requirement, &self.host_version)?;
        }

        let entry_point = descriptor.entry_point();
        let source = std::fs::read_to_string(&entry_point).map_err(|source| LoadError::Read {
            path: entry_point.clone(),
            source,
        })?;

        let engine = build_engine(&descriptor.name, self.operation_limit);
        let ast = engine
            .compile(&source)
            .map_err(|e| LoadError::Compile(e.to_string()))?;

        let conforms = ast
            .iter_functions()
            .any(|f| f.name == REGISTRATION_FN && f.params.len() == 1);
        if !conforms {
            return Err(LoadError::MissingRegistrationFn);
        }

        // Top-level statements are the plugin's initialisation
        let mut scope = Scope::new();
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| LoadError::Initialization(e.to_string()))?;

        tracing::debug!(plugin = %descriptor.name, "plugin loaded");
        Ok(LoadedPlugin {
            name: descriptor.name.clone(),
            location: descriptor.location.clone(),
            manifest,
            engine: Rc::new(engine),
            ast: Rc::new(ast),
        })
    }

    /// Call the plugin's `register_commands` and commit what it staged.
    ///
    /// Either every staged command is registered or none is.
    pub fn register_into(
        &mut self,
        plugin: &LoadedPlugin,
        registry: &mut CapabilityRegistry,
    ) -> Result<RegistrationSummary, RegistrationError> {
        let facade = RegistrationFacade::new(
            registry.names().map(str::to_string),
            self.exports.clone(),
        );

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let returned = plugin
            .engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut Scope::new(),
                &plugin.ast,
                REGISTRATION_FN,
                (facade.clone(),),
            )
            .map_err(|e| RegistrationError::Script(e.to_string()))?;

        let pending = facade.take_pending();
        let mut batch = HashSet::new();
        for command in &pending {
            if !is_valid_command_name(&command.name) {
                return Err(RegistrationError::InvalidName(command.name.clone()));
            }
            registry.check_available(&command.name)?;
            if !batch.insert(command.name.as_str()) {
                return Err(DuplicateCapability {
                    name: command.name.clone(),
                    owner: plugin.name.clone(),
                }
                .into());
            }
            if !handler_exists(&plugin.ast, &command.handler) {
                return Err(RegistrationError::InvalidHandler {
                    command: command.name.clone(),
                    function: command.handler.fn_name().to_string(),
                });
            }
        }

        let mut commands = Vec::with_capacity(pending.len());
        for command in pending {
            let handler = ScriptHandler::new(
                command.name.clone(),
                Rc::clone(&plugin.engine),
                Rc::clone(&plugin.ast),
                command.handler,
            );
            registry.register(Capability::external(
                command.name.clone(),
                command.description,
                Box::new(handler),
                plugin.name.clone(),
            ))?;
            commands.push(command.name);
        }

        if !returned.is_unit() {
            self.exports.insert(plugin.name.clone(), returned);
        }

        Ok(RegistrationSummary {
            plugin: plugin.name.clone(),
            commands,
        })
    }

    /// Discover, load and register every plugin under `root`.
    ///
    /// Never fails: each plugin's failure is logged and recorded.
    pub fn load_all(&mut self, root: &Path, registry: &mut CapabilityRegistry) -> LoadReport {
        let mut report = LoadReport::default();

        for descriptor in discover(root) {
            let manifest = PluginManifest::read(&descriptor.location).ok().flatten();
            let status = self.load_one(&descriptor, registry);
            report.outcomes.push(PluginOutcome {
                name: descriptor.name,
                location: descriptor.location,
                manifest,
                status,
            });
        }

        report
    }

    fn load_one(
        &mut self,
        descriptor: &PluginDescriptor,
        registry: &mut CapabilityRegistry,
    ) -> PluginStatus {
        if !descriptor.loadable {
            tracing::debug!(plugin = %descriptor.name, "skipping directory without entry point");
            return PluginStatus::NotLoadable;
        }

        let loaded = match self.load(descriptor) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(plugin = %descriptor.name, error = %e, "plugin failed to load");
                return PluginStatus::LoadFailed(e);
            }
        };

        match self.register_into(&loaded, registry) {
            Ok(summary) => {
                tracing::info!(
                    plugin = %descriptor.name,
                    commands = summary.commands.len(),
                    "plugin registered"
                );
                PluginStatus::Registered {
                    commands: summary.commands,
                }
            }
            Err(e) => {
                tracing::warn!(plugin = %descriptor.name, error = %e, "plugin failed to register");
                PluginStatus::RegistrationFailed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_plugin(root: &Path, name: &str, source: &str) -> PluginDescriptor {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(super::super::manifest::ENTRY_POINT), source).unwrap();
        PluginDescriptor::new(name, dir)
    }

    const GREETER: &str = r#"
        fn register_commands(registry) {
            registry.command("greet", "Say hello", Fn("greet"));
        }
        fn greet(args) { "hello" }
    "#;

    #[test]
    fn test_load_and_register() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(root.path(), "greeter", GREETER);
        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();

        let plugin = loader.load(&descriptor).unwrap();
        let summary = loader.register_into(&plugin, &mut registry).unwrap();

        assert_eq!(summary.commands, ["greet"]);
        let greet = registry.lookup("greet").unwrap();
        assert_eq!(greet.owner(), "greeter");
        assert_eq!(greet.description(), "Say hello");
    }

    #[test]
    fn test_missing_registration_fn_is_rejected_at_load() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(root.path(), "lazy", "fn register(r) {}");
        let err = PluginLoader::default().load(&descriptor).unwrap_err();
        assert!(matches!(err, LoadError::MissingRegistrationFn));
    }

    #[test]
    fn test_wrong_arity_is_rejected_at_load() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(root.path(), "odd", "fn register_commands() {}");
        let err = PluginLoader::default().load(&descriptor).unwrap_err();
        assert!(matches!(err, LoadError::MissingRegistrationFn));
    }

    #[test]
    fn test_syntax_error_is_a_compile_error() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(root.path(), "broken", "fn register_commands(r) {");
        let err = PluginLoader::default().load(&descriptor).unwrap_err();
        assert!(matches!(err, LoadError::Compile(_)));
    }

    #[test]
    fn test_throwing_top_level_is_an_initialization_error() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "throws",
            r#"throw "boom"; fn register_commands(r) {}"#,
        );
        let err = PluginLoader::default().load(&descriptor).unwrap_err();
        assert!(matches!(err, LoadError::Initialization(ref m) if m.contains("boom")));
    }

    #[test]
    fn test_incompatible_manifest() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(root.path(), "future", GREETER);
        fs::write(descriptor.location.join("plugin.yaml"), "requires: \">=9.0.0\"\n").unwrap();
        let err = PluginLoader::default().load(&descriptor).unwrap_err();
        assert!(matches!(err, LoadError::Incompatible { .. }));
    }

    #[test]
    fn test_registration_is_atomic() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "half",
            r#"
            fn register_commands(registry) {
                registry.command("fine", Fn("ok"));
                registry.command("create", Fn("ok"));
            }
            fn ok(args) {}
            "#,
        );
        let mut registry = CapabilityRegistry::new();
        registry.register(Capability::builtin("create", "")).unwrap();
        let mut loader = PluginLoader::default();

        let plugin = loader.load(&descriptor).unwrap();
        let err = loader.register_into(&plugin, &mut registry).unwrap_err();

        assert!(matches!(err, RegistrationError::Duplicate(ref d) if d.owner == "builtin"));
        assert!(!registry.contains("fine"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_within_one_plugin() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "twice",
            r#"
            fn register_commands(registry) {
                registry.command("same", Fn("ok"));
                registry.command("same", Fn("ok"));
            }
            fn ok(args) {}
            "#,
        );
        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let plugin = loader.load(&descriptor).unwrap();
        assert!(loader.register_into(&plugin, &mut registry).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handler_must_exist() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "dangling",
            r#"fn register_commands(registry) { registry.command("x", Fn("nope")); }"#,
        );
        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let plugin = loader.load(&descriptor).unwrap();
        let err = loader.register_into(&plugin, &mut registry).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidHandler { .. }));
    }

    #[test]
    fn test_invalid_command_name() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "spaces",
            r#"
            fn register_commands(registry) { registry.command("rm -rf", Fn("ok")); }
            fn ok(args) {}
            "#,
        );
        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let plugin = loader.load(&descriptor).unwrap();
        let err = loader.register_into(&plugin, &mut registry).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidName(_)));
    }

    #[test]
    fn test_script_error_during_registration() {
        let root = tempfile::tempdir().unwrap();
        let descriptor = write_plugin(
            root.path(),
            "angry",
            r#"fn register_commands(registry) { throw "no thanks"; }"#,
        );
        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let plugin = loader.load(&descriptor).unwrap();
        let err = loader.register_into(&plugin, &mut registry).unwrap_err();
        assert!(matches!(err, RegistrationError::Script(ref m) if m.contains("no thanks")));
    }

    #[test]
    fn test_exports_are_visible_to_later_plugins() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(
            root.path(),
            "a-base",
            r#"
            fn register_commands(registry) {
                registry.command("base", Fn("run"));
                #{ greeting: "hi from base" }
            }
            fn run(args) {}
            "#,
        );
        write_plugin(
            root.path(),
            "b-extension",
            r#"
            fn register_commands(registry) {
                let base = registry.exports("a-base");
                if base.greeting == "hi from base" && registry.has("base") {
                    registry.command("extended", Fn("run"));
                }
            }
            fn run(args) {}
            "#,
        );

        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let report = loader.load_all(root.path(), &mut registry);

        assert_eq!(report.registered().count(), 2);
        assert!(registry.contains("extended"));
        assert!(loader.exports("a-base").is_some());
        assert!(loader.exports("b-extension").is_none());
    }

    #[test]
    fn test_load_all_records_every_plugin() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "good", GREETER);
        write_plugin(root.path(), "bad", "fn register_commands(r) {");
        fs::create_dir(root.path().join("notes")).unwrap();

        let mut loader = PluginLoader::default();
        let mut registry = CapabilityRegistry::new();
        let report = loader.load_all(root.path(), &mut registry);

        let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["bad", "good", "notes"]);
        assert!(matches!(report.get("bad").unwrap().status, PluginStatus::LoadFailed(_)));
        assert!(report.get("good").unwrap().status.is_registered());
        assert!(matches!(report.get("notes").unwrap().status, PluginStatus::NotLoadable));
        assert_eq!(report.failures().count(), 1);
        assert!(registry.contains("greet"));
    }
}
