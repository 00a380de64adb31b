//! Layered settings: built-in defaults, an optional config file, then
//! `BEE_IOTOP_*` environment variables.
//!
//! Command line flags are applied on top by the binary.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Prefix of the environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "BEE_IOTOP";

pub const DEFAULT_URI: &str = "http://localhost:15601";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

/// Connection and display settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URI of the SensorBee server.
    pub uri: String,
    pub api_version: String,
    /// Topology to monitor.
    pub topology: Option<String>,
    /// Refresh interval in seconds.
    pub interval: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            topology: None,
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    ///
    /// A missing file is an error when `path` is given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.uri, "http://localhost:15601");
        assert_eq!(settings.api_version, "v1");
        assert_eq!(settings.topology, None);
        assert_eq!(settings.interval, 1.0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "topology = \"demo\"").unwrap();
        writeln!(file, "interval = 2.5").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.topology.as_deref(), Some("demo"));
        assert_eq!(settings.interval, 2.5);
        assert_eq!(settings.uri, DEFAULT_URI);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
