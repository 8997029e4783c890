//! [`Progress`] rendered with cliclack spinners and log lines

use crate::config::Settings;
use crate::progress::Progress;
use cliclack::ProgressBar;
use std::cell::RefCell;

/// One spinner at a time; `start` while a spinner is running replaces it.
///
/// Spinners redraw the current line, so they are only used when child
/// output is not streamed to the terminal. Otherwise `start` logs a step.
pub struct ClackProgress {
    animate: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ClackProgress {
    pub fn new(animate: bool) -> Self {
        Self {
            animate,
            spinner: RefCell::new(None),
        }
    }

    /// Spinners unless `stream_output` sends command output to the terminal
    pub fn for_settings(settings: &Settings) -> Self {
        Self::new(!settings.stream_output)
    }

    fn clear(&self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop("");
        }
    }
}

impl Progress for ClackProgress {
    fn start(&self, message: &str) {
        self.clear();
        if !self.animate {
            let _ = cliclack::log::step(message);
            return;
        }
        let spinner = cliclack::spinner();
        spinner.start(message);
        self.spinner.replace(Some(spinner));
    }

    fn stop(&self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => {
                let _ = cliclack::log::step(message);
            }
        }
    }

    fn warn(&self, message: &str) {
        // A running spinner would overwrite the warning line
        self.clear();
        let _ = cliclack::log::warning(message);
    }

    fn info(&self, message: &str) {
        let _ = cliclack::log::info(message);
    }
}

impl Drop for ClackProgress {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.get_mut().take() {
            spinner.stop("");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamed_output_never_gets_a_spinner() {
        let settings = Settings {
            stream_output: true,
            ..Settings::default()
        };
        let progress = ClackProgress::for_settings(&settings);
        progress.start("Installing black...");
        assert!(progress.spinner.borrow().is_none());
        progress.start("Formatting...");
        assert!(progress.spinner.borrow().is_none());
        progress.stop("done");

        let quiet = Settings {
            stream_output: false,
            ..Settings::default()
        };
        assert!(ClackProgress::for_settings(&quiet).animate);
    }
}
