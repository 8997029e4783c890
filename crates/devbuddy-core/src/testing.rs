//! Test doubles for the toolchain and progress seams
//!
//! [`FakeToolchain`] scripts which executables exist, what running them does
//! to the filesystem and PATH, and which of them fail. Nothing touches the
//! real PATH.

use crate::error::ProcessError;
use crate::progress::Progress;
use crate::runtime::{Invocation, Toolchain};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Shared, ordered log of events from several fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Records every progress call as `kind: message`
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    journal: Journal,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.entries()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl Progress for RecordingProgress {
    fn start(&self, message: &str) {
        self.journal.record(format!("start: {}", message));
    }

    fn stop(&self, message: &str) {
        self.journal.record(format!("stop: {}", message));
    }

    fn warn(&self, message: &str) {
        self.journal.record(format!("warn: {}", message));
    }

    fn info(&self, message: &str) {
        self.journal.record(format!("info: {}", message));
    }
}

#[derive(Debug, Default)]
struct Effect {
    provides: Vec<String>,
    /// Relative path and contents; a trailing `/` creates a directory
    files: Vec<(String, String)>,
}

/// Scripted [`Toolchain`].
///
/// Effects and failures are keyed by program (`git`) or by program and
/// first argument (`git init`); the more specific key wins.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    tools: RefCell<BTreeSet<String>>,
    failing: HashSet<String>,
    effects: HashMap<String, Effect>,
    captures: HashMap<String, String>,
    base_dir: Option<PathBuf>,
    invocations: RefCell<Vec<Invocation>>,
    journal: Option<Journal>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools<I, S>(self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools
            .borrow_mut()
            .extend(tools.into_iter().map(Into::into));
        self
    }

    /// Running `key` puts `provides` on PATH
    pub fn installs(mut self, key: &str, provides: &str) -> Self {
        self.effects
            .entry(key.to_string())
            .or_default()
            .provides
            .push(provides.to_string());
        self
    }

    /// Running `key` exits with status 1
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Running `key` creates an empty file (or a directory, for a trailing `/`)
    pub fn creates(self, key: &str, relative: &str) -> Self {
        self.creates_file(key, relative, "")
    }

    pub fn creates_file(mut self, key: &str, relative: &str, contents: &str) -> Self {
        self.effects
            .entry(key.to_string())
            .or_default()
            .files
            .push((relative.to_string(), contents.to_string()));
        self
    }

    /// Output returned by `capture` for `key`
    pub fn captures(mut self, key: &str, output: &str) -> Self {
        self.captures.insert(key.to_string(), output.to_string());
        self
    }

    /// Directory effects are applied in when an invocation has no working directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Invocations rendered as command lines
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|inv| inv.to_string())
            .collect()
    }

    fn keys(invocation: &Invocation) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(first) = invocation.arguments().first() {
            keys.push(format!("{} {}", invocation.program(), first));
        }
        keys.push(invocation.program().to_string());
        keys
    }

    fn record(&self, invocation: &Invocation, verb: &str) -> Result<Vec<String>, ProcessError> {
        self.invocations.borrow_mut().push(invocation.clone());
        if let Some(journal) = &self.journal {
            journal.record(format!("{}: {}", verb, invocation));
        }

        if !self.tools.borrow().contains(invocation.program()) {
            return Err(ProcessError::NotFound {
                program: invocation.program().to_string(),
            });
        }

        let keys = Self::keys(invocation);
        if keys.iter().any(|k| self.failing.contains(k)) {
            return Err(ProcessError::Failed {
                command: invocation.to_string(),
                code: Some(1),
            });
        }
        Ok(keys)
    }

    fn apply(&self, invocation: &Invocation, effect: &Effect) -> Result<(), ProcessError> {
        self.tools
            .borrow_mut()
            .extend(effect.provides.iter().cloned());

        let Some(dir) = invocation.cwd().or(self.base_dir.as_deref()) else {
            return Ok(());
        };
        for (relative, contents) in &effect.files {
            write_effect(dir, relative, contents).map_err(|source| ProcessError::Spawn {
                program: invocation.program().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

fn write_effect(dir: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
    let path = dir.join(relative.trim_end_matches('/'));
    if relative.ends_with('/') {
        return std::fs::create_dir_all(path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

impl Toolchain for FakeToolchain {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools
            .borrow()
            .contains(program)
            .then(|| PathBuf::from("/fake/bin").join(program))
    }

    async fn run(&self, invocation: &Invocation, _limit: Duration) -> Result<(), ProcessError> {
        let keys = self.record(invocation, "run")?;
        if let Some(effect) = keys.iter().find_map(|k| self.effects.get(k)) {
            self.apply(invocation, effect)?;
        }
        Ok(())
    }

    async fn capture(
        &self,
        invocation: &Invocation,
        _limit: Duration,
    ) -> Result<String, ProcessError> {
        let keys = self.record(invocation, "capture")?;
        Ok(keys
            .iter()
            .find_map(|k| self.captures.get(k))
            .cloned()
            .unwrap_or_default())
    }
}
