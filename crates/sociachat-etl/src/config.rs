use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use sociachat_core::model::DistanceSpace;
use sociachat_search::{Client, OnnxEmbedder, RetrieveOptions, MAX_BATCH_SIZE};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EtlError, EtlResult};

/// Embedding backend used to open the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Sentence-transformer model loaded from `model_dir`.
    #[default]
    Onnx,
    /// Built-in word-hashing embedder; needs no model files.
    Hash,
}

impl EmbedderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Hash => "hash",
        }
    }
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbedderKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "hash" => Ok(Self::Hash),
            other => Err(EtlError::Config(format!("unknown embedder: {other}"))),
        }
    }
}

/// Configuration for sociachat.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SOCIACHAT_* prefix)
/// 3. Config file (~/.config/sociachat/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite store holding the collections.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: SOCIACHAT_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/sociachat/sociachat.db
    pub database_path: PathBuf,

    /// Collection that loads write to and queries read from.
    pub collection_name: String,

    /// Directory scanned for `.csv` files.
    pub data_dir: PathBuf,

    /// CSV column holding the document text.
    pub text_column: String,

    /// Topic tag stored in every document's metadata.
    pub topic: String,

    /// Documents per `add` call.
    pub batch_size: usize,

    /// Entries rendered into a query summary.
    pub top_k: usize,

    /// Nearest candidates fetched per query before ranking.
    pub candidate_limit: usize,

    /// Distance space for newly created collections.
    pub distance: DistanceSpace,

    /// Embedding backend for loads and queries.
    pub embedder: EmbedderKind,

    /// Directory holding `model.onnx` and `tokenizer.json` for the `onnx`
    /// embedder.
    ///
    /// Default: ~/.local/share/sociachat/models/all-MiniLM-L6-v2
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            collection_name: String::from("politik2"),
            data_dir: PathBuf::from("."),
            text_column: String::from("tweet"),
            topic: String::from("politik"),
            batch_size: 5000,
            top_k: 10,
            candidate_limit: 1000,
            distance: DistanceSpace::L2,
            embedder: EmbedderKind::Onnx,
            model_dir: default_model_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/sociachat/config.toml
    /// Reads environment variables with SOCIACHAT_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new()
            .context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path.to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder.add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("sociachat");
        builder.add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Check the values a load depends on.
    pub fn validate_load(&self) -> EtlResult<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(EtlError::Config(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.text_column.is_empty() {
            return Err(EtlError::Config("text_column must not be empty".to_string()));
        }
        self.validate_collection_name()
    }

    /// Check the values a query depends on.
    pub fn validate_query(&self) -> EtlResult<()> {
        if self.top_k == 0 {
            return Err(EtlError::Config("top_k must be at least 1".to_string()));
        }
        self.validate_collection_name()
    }

    fn validate_collection_name(&self) -> EtlResult<()> {
        if self.collection_name.is_empty() {
            return Err(EtlError::Config("collection_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Open the store with the configured embedder.
    ///
    /// The `onnx` embedder fails here when `model_dir` lacks the model
    /// files.
    pub fn open_client(&self) -> EtlResult<Client> {
        let client = Client::open(&self.database_path)?;
        match self.embedder {
            EmbedderKind::Onnx => {
                let embedder = OnnxEmbedder::from_directory(&self.model_dir)?;
                Ok(client.with_embedder(embedder))
            }
            EmbedderKind::Hash => Ok(client),
        }
    }

    /// Ranking parameters for queries.
    #[must_use]
    pub fn retrieve_options(&self) -> RetrieveOptions {
        RetrieveOptions {
            top_k: self.top_k,
            candidate_limit: self.candidate_limit,
        }
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/sociachat/sociachat.db (or platform equivalent)
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sociachat")
        .join("sociachat.db")
}

/// Get the default sentence-transformer model directory.
///
/// Returns: ~/.local/share/sociachat/models/all-MiniLM-L6-v2 (or platform
/// equivalent)
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sociachat")
        .join("models")
        .join("all-MiniLM-L6-v2")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/sociachat/config.toml
/// - macOS: ~/Library/Application Support/sociachat/config.toml
/// - Windows: %APPDATA%\sociachat\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sociachat")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Sociachat Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (SOCIACHAT_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite store holding the collections
#
# Can also be set via:
# - CLI: sociachat --db /custom/path.db load
# - Environment: SOCIACHAT_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/sociachat.db"

# Collection that `load` writes to and `query` reads from
collection_name = "politik2"

# Directory scanned (non-recursively) for .csv files
data_dir = "."

# CSV column holding the tweet text
text_column = "tweet"

# Topic stored as {"keyword": <topic>} on every document
topic = "politik"

# Documents per add call (at most 5461)
batch_size = 5000

# Entries rendered into a query summary
top_k = 10

# Nearest candidates fetched per query before ranking
candidate_limit = 1000

# Distance space for new collections: "l2", "cosine" or "ip"
distance = "l2"

# Embedding backend: "onnx" (sentence-transformer model) or "hash"
# (word hashing, no model files; only matches shared words)
embedder = "onnx"

# Directory with model.onnx and tokenizer.json for the onnx embedder
# (an all-MiniLM-L6-v2 export)
#
# Default: Platform-specific data directory
#model_dir = "/path/to/all-MiniLM-L6-v2"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config())
        .context("Failed to write config file")?;

    Ok(true)
}
