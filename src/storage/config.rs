//! Deployment configuration for the import engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Import configuration, loaded from an optional TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Minimum route distance in miles for an IBA-qualifying result
    pub min_qualifying_miles: i64,
    /// Route code substituted when a payload carries an unknown code
    pub default_route: String,
    /// Verifier tag stamped on imported rides
    pub verifier: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            min_qualifying_miles: 1000,
            default_route: "A-NCW".to_string(),
            verifier: "RBLR".to_string(),
        }
    }
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    directories::ProjectDirs::from("uk.co", "ironbutt", "rideroster")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Load import configuration.
///
/// An explicitly supplied path must exist and parse. The default path is
/// optional: when the file is absent, built-in defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<ImportConfig, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (get_config_path(), false),
    };

    if !path.exists() {
        if required {
            return Err(ConfigError::IoError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(ImportConfig::default());
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let config: ImportConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.min_qualifying_miles, 1000);
        assert_eq!(config.default_route, "A-NCW");
        assert_eq!(config.verifier, "RBLR");
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_qualifying_miles = 500").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.min_qualifying_miles, 500);
        assert_eq!(config.default_route, "A-NCW");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/rideroster.toml")));
        assert!(result.is_err());
    }
}
