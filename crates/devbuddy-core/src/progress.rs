//! Progress reporting seam.
//!
//! The core announces long-running steps and ambient side effects through
//! this trait; the `tui` feature renders them with cliclack spinners.

pub trait Progress {
    /// A long-running step begins
    fn start(&self, message: &str);

    /// The current step finished
    fn stop(&self, message: &str);

    /// Something the user must see before it happens (e.g. a global install)
    fn warn(&self, message: &str);

    fn info(&self, message: &str);
}

/// Discards everything; used in tests and non-interactive embedding
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn start(&self, _message: &str) {}
    fn stop(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
}
