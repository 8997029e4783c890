//! In-memory registry of named commands.
//!
//! Built-in commands and plugin commands share one namespace. The registry is
//! created once at start-up, filled before any command is dispatched, and
//! passed by reference to whoever needs it. A name can be registered only
//! once: later registrations under the same name are rejected.

use crate::error::DuplicateCapability;
use std::collections::HashMap;
use std::fmt;

/// Owner label for commands compiled into the binary
pub const BUILTIN_OWNER: &str = "builtin";

/// Something that can execute a plugin-contributed command
pub trait CommandHandler {
    fn invoke(&self, args: &[String]) -> anyhow::Result<()>;
}

/// How a capability is executed
pub enum Handler {
    /// Dispatched by the command layer itself
    Builtin,
    /// Dispatched through the registry
    External(Box<dyn CommandHandler>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Builtin => f.write_str("Builtin"),
            Handler::External(_) => f.write_str("External(..)"),
        }
    }
}

/// A named, invocable command
#[derive(Debug)]
pub struct Capability {
    name: String,
    description: String,
    handler: Handler,
    source_plugin: Option<String>,
}

impl Capability {
    pub fn builtin(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Handler::Builtin,
            source_plugin: None,
        }
    }

    pub fn external(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Box<dyn CommandHandler>,
        plugin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Handler::External(handler),
            source_plugin: Some(plugin.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source_plugin(&self) -> Option<&str> {
        self.source_plugin.as_deref()
    }

    /// Plugin name, or `builtin`
    pub fn owner(&self) -> &str {
        self.source_plugin.as_deref().unwrap_or(BUILTIN_OWNER)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.handler, Handler::Builtin)
    }

    pub fn invoke(&self, args: &[String]) -> anyhow::Result<()> {
        match &self.handler {
            Handler::Builtin => {
                anyhow::bail!("`{}` is a built-in command and is not dispatched here", self.name)
            }
            Handler::External(handler) => handler.invoke(args),
        }
    }
}

#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Capability>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Capability) -> Result<(), DuplicateCapability> {
        self.check_available(capability.name())?;
        self.index
            .insert(capability.name.clone(), self.capabilities.len());
        self.capabilities.push(capability);
        Ok(())
    }

    /// Err if `name` is taken
    pub fn check_available(&self, name: &str) -> Result<(), DuplicateCapability> {
        match self.lookup(name) {
            Some(existing) => Err(DuplicateCapability {
                name: name.to_string(),
                owner: existing.owner().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        self.index.get(name).map(|&i| &self.capabilities[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All capabilities in registration order
    pub fn list_all(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(|c| c.name())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

/// Command names are lowercase-friendly CLI tokens: `count-lines`, `sys_info`
pub fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
