//! Host API exposed to plugin scripts
//!
//! A plugin's `register_commands(registry)` receives a [`RegistrationFacade`]
//! (script type `Registry`):
//!
//! ```text
//! fn register_commands(registry) {
//!     registry.command("count-lines", "Count lines in a file", Fn("count_lines"));
//!     #{ count_lines: "count-lines" }
//! }
//!
//! fn count_lines(args) {
//!     let lines = read_lines(args[0]);
//!     `${args[0]}: ${lines.len()} lines`
//! }
//! ```
//!
//! Commands are only staged by the facade. The loader validates and commits
//! them once `register_commands` has returned.

use crate::registry::CommandHandler;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Map, AST};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use super::version::HOST_VERSION;

/// Script type name of the facade
pub const REGISTRY_TYPE: &str = "Registry";

/// A command staged by a plugin, not yet in the registry
#[derive(Debug, Clone)]
pub struct PendingCommand {
    pub name: String,
    pub description: String,
    pub handler: FnPtr,
}

#[derive(Debug, Default)]
struct FacadeState {
    pending: Vec<PendingCommand>,
    taken: HashSet<String>,
    exports: BTreeMap<String, Dynamic>,
}

/// What a plugin sees as `registry` during registration
#[derive(Debug, Clone, Default)]
pub struct RegistrationFacade {
    state: Rc<RefCell<FacadeState>>,
}

impl RegistrationFacade {
    /// `taken` are the names already registered; `exports` come from earlier plugins
    pub fn new<I>(taken: I, exports: BTreeMap<String, Dynamic>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            state: Rc::new(RefCell::new(FacadeState {
                pending: Vec::new(),
                taken: taken.into_iter().collect(),
                exports,
            })),
        }
    }

    fn stage(&mut self, name: &str, description: &str, handler: FnPtr) {
        self.state.borrow_mut().pending.push(PendingCommand {
            name: name.to_string(),
            description: description.to_string(),
            handler,
        });
    }

    fn has(&mut self, name: &str) -> bool {
        let state = self.state.borrow();
        state.taken.contains(name) || state.pending.iter().any(|p| p.name == name)
    }

    fn exports_of(&mut self, plugin: &str) -> Dynamic {
        self.state
            .borrow()
            .exports
            .get(plugin)
            .cloned()
            .unwrap_or(Dynamic::UNIT)
    }

    /// Drain everything the plugin staged
    pub fn take_pending(&self) -> Vec<PendingCommand> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }
}

/// Build the sandboxed engine for one plugin
pub fn build_engine(plugin: &str, operation_limit: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(operation_limit);

    let name = plugin.to_string();
    engine.on_debug(move |text, _source, pos| {
        tracing::debug!(plugin = %name, position = %pos, "{}", text);
    });

    engine
        .register_type_with_name::<RegistrationFacade>(REGISTRY_TYPE)
        .register_fn(
            "command",
            |registry: &mut RegistrationFacade,
             name: ImmutableString,
             description: ImmutableString,
             handler: FnPtr| registry.stage(&name, &description, handler),
        )
        .register_fn(
            "command",
            |registry: &mut RegistrationFacade, name: ImmutableString, handler: FnPtr| {
                registry.stage(&name, "", handler)
            },
        )
        .register_fn("has", |registry: &mut RegistrationFacade, name: ImmutableString| {
            registry.has(&name)
        })
        .register_fn(
            "exports",
            |registry: &mut RegistrationFacade, plugin: ImmutableString| {
                registry.exports_of(&plugin)
            },
        );

    engine
        .register_fn("host_info", host_info)
        .register_fn("read_lines", read_lines);

    engine
}

fn host_info() -> Map {
    let mut info = Map::new();
    info.insert("os".into(), Dynamic::from(std::env::consts::OS.to_string()));
    info.insert("arch".into(), Dynamic::from(std::env::consts::ARCH.to_string()));
    info.insert(
        "family".into(),
        Dynamic::from(std::env::consts::FAMILY.to_string()),
    );
    info.insert("version".into(), Dynamic::from(HOST_VERSION.to_string()));
    info
}

fn read_lines(path: ImmutableString) -> Result<Array, Box<EvalAltResult>> {
    let content = std::fs::read_to_string(path.as_str())
        .map_err(|e| format!("cannot read {}: {}", path, e))?;
    Ok(content
        .lines()
        .map(|line| Dynamic::from(line.to_string()))
        .collect())
}

/// True if `ast` defines the function a pointer names, taking one argument after currying
pub fn handler_exists(ast: &AST, handler: &FnPtr) -> bool {
    let params = handler.curry().len() + 1;
    ast.iter_functions()
        .any(|f| f.name == handler.fn_name() && f.params.len() == params)
}

/// Executes a plugin command by calling back into its script
pub struct ScriptHandler {
    command: String,
    engine: Rc<Engine>,
    ast: Rc<AST>,
    handler: FnPtr,
}

impl ScriptHandler {
    pub fn new(command: impl Into<String>, engine: Rc<Engine>, ast: Rc<AST>, handler: FnPtr) -> Self {
        Self {
            command: command.into(),
            engine,
            ast,
            handler,
        }
    }

    /// Call the handler and return its value
    pub fn call(&self, args: &[String]) -> anyhow::Result<Dynamic> {
        let args: Array = args.iter().cloned().map(Dynamic::from).collect();
        self.handler
            .call::<Dynamic>(&self.engine, &self.ast, (args,))
            .map_err(|e| anyhow::anyhow!("`{}` failed: {}", self.command, e))
    }
}

impl CommandHandler for ScriptHandler {
    fn invoke(&self, args: &[String]) -> anyhow::Result<()> {
        let result = self.call(args)?;
        if !result.is_unit() {
            println!("{}", result);
        }
        Ok(())
    }
}
