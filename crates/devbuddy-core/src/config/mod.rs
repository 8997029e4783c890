//! User configuration (`config.yaml`) and environment overrides

pub mod settings;

pub use settings::Settings;
