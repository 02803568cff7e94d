//! Probe settings loader.
//!
//! Settings come from a JSON file, either given explicitly or found in the
//! user config directory, and are then overridden by command-line flags.

use crate::config::settings::ProbeSettings;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File name looked up inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Command-line overrides for individual settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsOverrides {
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub latency_threshold_ms: Option<u64>,
    pub delay_ms: Option<u64>,
    pub no_sleep: bool,
}

/// Probe settings loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let settings = ConfigLoader::load_from_file("dnsck.json")?;
    /// println!("timeout: {} ms", settings.timeout_ms);
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ProbeSettings> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let settings: ProbeSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from `$CONFIG_DIR/dnsck/config.json`.
    ///
    /// A missing file is not an error and yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_default() -> Result<ProbeSettings> {
        let path = Self::config_dir().join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!("Loading settings from {}", path.display());
            Self::load_from_file(path)
        } else {
            Ok(ProbeSettings::default())
        }
    }

    /// Load settings from an explicit file if given, else the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<ProbeSettings> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    /// Get the config directory path.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dnsck")
    }

    /// Apply command-line overrides on top of loaded settings.
    ///
    /// `no_sleep` wins over any delay value.
    #[must_use]
    pub fn apply(mut settings: ProbeSettings, overrides: SettingsOverrides) -> ProbeSettings {
        if let Some(port) = overrides.port {
            settings.port = port;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(threshold) = overrides.latency_threshold_ms {
            settings.latency_threshold_ms = threshold;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            settings.delay_ms = delay_ms;
        }
        if overrides.no_sleep {
            settings = settings.without_delay();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 5353, "latency_threshold_ms": 250}}"#).unwrap();

        let settings = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(settings.port, 5353);
        assert_eq!(settings.latency_threshold_ms, 250);
        assert_eq!(settings.timeout_ms, 10_000);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load(Some(dir.path().join("nope.json").as_path()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port = 53").unwrap();

        let result = ConfigLoader::load_from_file(file.path());
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_overrides_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_ms": 3000, "delay_ms": 200}}"#).unwrap();
        let loaded = ConfigLoader::load_from_file(file.path()).unwrap();

        let overrides = SettingsOverrides {
            timeout_ms: Some(1500),
            ..SettingsOverrides::default()
        };
        let settings = ConfigLoader::apply(loaded, overrides);
        assert_eq!(settings.timeout_ms, 1500);
        assert_eq!(settings.delay_ms, 200);
    }

    #[test]
    fn test_no_sleep_beats_delay() {
        let overrides = SettingsOverrides {
            delay_ms: Some(700),
            no_sleep: true,
            ..SettingsOverrides::default()
        };
        let settings = ConfigLoader::apply(ProbeSettings::default(), overrides);
        assert_eq!(settings.delay_ms, 0);
    }
}
