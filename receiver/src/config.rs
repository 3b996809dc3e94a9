use std::{
    fs, io,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use processing::VELOCITY_CUTOFF_HZ;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Receiver settings; every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Session files are named `{output_prefix}_{index:02}.txt`.
    pub output_prefix: PathBuf,
    /// Low-pass cutoff for angular velocity, in Hz.
    pub cutoff_hz: f64,
    /// Write a CSV of every processed series next to its session file.
    pub export_csv: bool,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            output_prefix: PathBuf::from("session"),
            cutoff_hz: VELOCITY_CUTOFF_HZ,
            export_csv: false,
            log_filter: "info".to_string(),
        }
    }
}

/// Load the config file at `path`, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ReceiverConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ReceiverConfig::default());
    };
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, ReceiverConfig::default());
        assert_eq!(config.output_prefix, PathBuf::from("session"));
        assert_eq!(config.cutoff_hz, 20.0);
        assert!(!config.export_csv);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receiver.toml");
        fs::write(&path, "output_prefix = \"data/walk\"\nexport_csv = true\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output_prefix, PathBuf::from("data/walk"));
        assert!(config.export_csv);
        assert_eq!(config.cutoff_hz, 20.0);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receiver.toml");
        let config = ReceiverConfig {
            cutoff_hz: 12.5,
            log_filter: "debug".into(),
            ..ReceiverConfig::default()
        };
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn missing_or_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receiver.toml");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Read { .. })));

        fs::write(&path, "cutoff_hz = \"fast\"\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse { .. })));
    }
}
