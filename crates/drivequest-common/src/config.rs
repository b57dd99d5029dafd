//! Layered configuration loading
//!
//! Every DriveQuest configuration struct is loaded the same way: serialized
//! defaults, then a TOML file, then prefixed environment variables split on
//! `__` (e.g. `DRIVEQUEST_STORAGE__DATA_DIR`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Loader implemented by configuration roots.
pub trait ConfigLoader: Serialize + DeserializeOwned + Default {
    /// File read when no explicit path is given.
    const DEFAULT_FILE: &'static str;

    /// Environment variable prefix, including the trailing underscore.
    const ENV_PREFIX: &'static str;

    /// Load from `path`, or from [`Self::DEFAULT_FILE`] when `None`.
    fn load(path: Option<PathBuf>) -> Result<Self, ConfigurationError> {
        let path = path.unwrap_or_else(|| PathBuf::from(Self::DEFAULT_FILE));
        Self::load_from_file(&path)
    }

    /// Missing files are tolerated; the defaults and environment still apply.
    fn load_from_file(path: &Path) -> Result<Self, ConfigurationError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigurationError::ParseError {
                details: e.to_string(),
            })
    }

    /// Render the defaults as TOML.
    fn generate_example() -> Result<String, ConfigurationError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct SampleConfig {
        name: String,
        interval_secs: u64,
    }

    impl Default for SampleConfig {
        fn default() -> Self {
            Self {
                name: "sample".to_string(),
                interval_secs: 30,
            }
        }
    }

    impl ConfigLoader for SampleConfig {
        const DEFAULT_FILE: &'static str = "does-not-exist-sample.toml";
        const ENV_PREFIX: &'static str = "DQ_SAMPLE_TEST_";
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = SampleConfig::load(None).unwrap();
        assert_eq!(config, SampleConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "interval_secs = 5").unwrap();

        let config = SampleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.name, "sample");
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "interval_secs = \"soon\"").unwrap();

        let result = SampleConfig::load_from_file(file.path());
        assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
    }

    #[test]
    fn test_generate_example_round_trips() {
        let rendered = SampleConfig::generate_example().unwrap();
        let parsed: SampleConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, SampleConfig::default());
    }
}
