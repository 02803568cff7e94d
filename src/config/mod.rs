//! Configuration module.
//!
//! This module provides the probe tuning parameters and loads them
//! from config files and command-line overrides.

pub mod loader;
pub mod settings;

pub use loader::{ConfigLoader, SettingsOverrides};
pub use settings::ProbeSettings;
