//! docweave configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::helpers::DEFAULT_MAX_DEPTH;
use crate::markdown::MarkdownConfig;

/// Main docweave configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Template compilation settings
    pub templates: TemplatesConfig,

    /// Source discovery settings
    pub discovery: DiscoveryConfig,

    /// Markdown feature set
    pub markdown: MarkdownConfig,

    /// External program settings
    pub process: ProcessConfig,

    /// Preview server settings
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: docweave.yml
        let local_config = PathBuf::from("docweave.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/docweave/docweave.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("docweave").join("docweave.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, ignoring any other problems with the file
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Template compilation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// File extensions compiled with markup delimiters in `--html` mode
    #[serde(rename = "markup-extensions")]
    pub markup_extensions: Vec<String>,

    /// Maximum nesting of macro/markdown invocations
    #[serde(rename = "max-depth")]
    pub max_depth: usize,

    /// Treat missing variables as render errors
    pub strict: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            markup_extensions: ["html", "htm", "xml", "svg", "xhtml"].iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

/// Source discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Descend into subdirectories of the source root
    pub recursive: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// External program settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Program used by `include` to read a file
    #[serde(rename = "include-program")]
    pub include_program: String,

    /// Program used by `closure` to minify scripts
    #[serde(rename = "closure-program")]
    pub closure_program: String,

    /// Timeout for each external program in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            include_program: "cat".to_string(),
            closure_program: "closure-compiler".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Preview server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Directory to serve; defaults to the output file's directory
    #[serde(rename = "public-dir")]
    pub public_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            public_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.templates.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.templates.markup_extensions.contains(&"html".to_string()));
        assert!(config.discovery.recursive);
        assert!(config.markdown.tables);
        assert_eq!(config.process.include_program, "cat");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docweave.yml");
        std::fs::write(
            &path,
            "log-level: debug\ntemplates:\n  max-depth: 3\nmarkdown:\n  smart-punctuation: false\nprocess:\n  timeout-ms: 500\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.templates.max_depth, 3);
        assert!(!config.templates.strict);
        assert!(!config.markdown.smart_punctuation);
        assert!(config.markdown.footnotes);
        assert_eq!(config.process.timeout_ms, 500);
        assert_eq!(config.process.include_program, "cat");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let path = PathBuf::from("/definitely/not/here/docweave.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert_eq!(Config::load_log_level(Some(&path)), None);
    }
}
