//! CLI configuration file

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

/// Defaults loadable from a TOML file, overridden by flags
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Ollama server URL
    pub server: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Directory for debug artifacts
    pub debug_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spektor.toml");
        std::fs::write(
            &path,
            "server = \"http://llm-box:11434\"\nmodel = \"qwen3:14b\"\n",
        )
        .unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.server.as_deref(), Some("http://llm-box:11434"));
        assert_eq!(config.model.as_deref(), Some("qwen3:14b"));
        assert!(config.debug_dir.is_none());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spektor.toml");
        std::fs::write(&path, "server = [broken").unwrap();

        assert!(CliConfig::from_file(&path).is_err());
    }
}
