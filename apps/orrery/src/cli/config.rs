//! # CLI Configuration
//!
//! Optional TOML file with default graph options and output settings:
//!
//! ```toml
//! [graph]
//! type = "directed"
//! multi = true
//! allowSelfLoops = false
//!
//! [output]
//! format = "binary"
//! pretty = false
//! ```
//!
//! Missing sections and keys fall back to their defaults.

use crate::error::CliError;
use orrery_core::GraphOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "orrery.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrreryConfig {
    /// Options for graphs the CLI builds from scratch (`merge`).
    pub graph: GraphOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format written by `convert` and `merge` when none is given.
    pub format: OutputFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Exported JSON document.
    #[default]
    Json,
    /// Header + postcard payload.
    Binary,
}

impl OrreryConfig {
    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Load `path`, or `orrery.toml` from the working directory if present,
    /// or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let path = match path {
            Some(path) => path,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            CliError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CliError::Config(format!(
                "'{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::GraphType;

    #[test]
    fn empty_file_gives_defaults() {
        let config = OrreryConfig::from_toml("").expect("parse");
        assert_eq!(config, OrreryConfig::default());
        assert!(config.output.pretty);
        assert_eq!(config.graph.graph_type, GraphType::Mixed);
    }

    #[test]
    fn partial_sections() {
        let config = OrreryConfig::from_toml(
            "[graph]\ntype = \"undirected\"\nallowSelfLoops = false\n\n[output]\nformat = \"binary\"\n",
        )
        .expect("parse");
        assert_eq!(config.graph.graph_type, GraphType::Undirected);
        assert!(!config.graph.multi);
        assert!(!config.graph.allow_self_loops);
        assert_eq!(config.output.format, OutputFormat::Binary);
        assert!(config.output.pretty);
    }

    #[test]
    fn bad_values_rejected() {
        assert!(matches!(
            OrreryConfig::from_toml("[graph]\ntype = \"sideways\"\n"),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            OrreryConfig::from_toml("[output]\npretty = \"yes\"\n"),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            OrreryConfig::load(Some(&missing)),
            Err(CliError::Config(_))
        ));
    }
}
