//! Configuration types for donotmock.

use crate::model::{MarkerSpec, NodeCategory};
use crate::registry::{
    ConstructionSignature, RegistryError, SignatureRegistry, SubjectRule, MOCK_ARITY,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Identity of the no-mock marker.
    #[serde(default)]
    pub marker: MarkerSpec,

    /// Signature table configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.name.is_empty() {
            return Err(ConfigError::Validation("marker.name must not be empty".into()));
        }
        if self.analyzer.parallelism == Some(0) {
            return Err(ConfigError::Validation(
                "analyzer.parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Builds the effective signature registry.
    ///
    /// # Errors
    ///
    /// Returns an error when a configured row is malformed or duplicates
    /// another row.
    pub fn build_registry(&self) -> Result<SignatureRegistry, RegistryError> {
        let mut builder = SignatureRegistry::builder();
        if self.registry.builtins {
            builder = builder.builtins();
        }
        builder
            .signatures(self.registry.signatures.iter().map(SignatureConfig::to_signature))
            .build()
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Number of worker threads (rayon default when unset).
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Abort instead of skipping files that fail to parse.
    #[serde(default)]
    pub fail_on_parse_error: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
            parallelism: None,
            fail_on_parse_error: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["**/bin/**".to_string(), "**/obj/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Signature table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Include the built-in mocking-library signatures.
    #[serde(default = "default_true")]
    pub builtins: bool,

    /// Additional signatures.
    #[serde(default)]
    pub signatures: Vec<SignatureConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            builtins: true,
            signatures: Vec::new(),
        }
    }
}

/// One `[[registry.signatures]]` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Library label.
    pub library: String,
    /// `construction` or `call`.
    pub category: NodeCategory,
    /// Constructed type, or type owning the factory method.
    pub container: String,
    /// Namespace of the container.
    pub namespace: String,
    /// Factory method, for calls.
    #[serde(default)]
    pub method: Option<String>,
    /// Required number of type arguments.
    #[serde(default = "default_arity")]
    pub arity: usize,
    /// Which type argument is the mocked subject.
    #[serde(default)]
    pub subject_index: usize,
}

fn default_arity() -> usize {
    MOCK_ARITY
}

impl SignatureConfig {
    /// Method/category consistency is left to the registry builder.
    fn to_signature(&self) -> ConstructionSignature {
        ConstructionSignature {
            library: self.library.clone(),
            category: self.category,
            container: self.container.clone(),
            namespace: self.namespace.clone(),
            method: self.method.clone(),
            arity: self.arity,
            subject: SubjectRule::TypeArgument(self.subject_index),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A value parsed but is not acceptable.
    #[error("Invalid config: {0}")]
    Validation(String),
}
