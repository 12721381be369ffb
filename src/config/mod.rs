//! Configuration management.
//!
//! Configuration is read from a TOML file whose sections all default, then
//! environment overrides (`PAPERLENS_*`, `GROQ_API_KEY`) are applied on top.

use crate::embedding::DEFAULT_DIMENSIONS;
use crate::models::IdStrategy;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the `SQLite` database inside the data directory.
pub const DATABASE_FILE: &str = "papers.db";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "papers";

/// Main configuration for paperlens.
#[derive(Debug, Clone)]
pub struct PaperlensConfig {
    /// Directory holding the database and term weights.
    pub data_dir: PathBuf,
    /// Name of the vector collection.
    pub collection: String,
    /// Embedding settings.
    pub embedding: EmbeddingSettings,
    /// Vector store settings.
    pub storage: StorageSettings,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Which embedder produces vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    /// Hashed TF-IDF with frozen weights.
    #[default]
    TermWeights,
    /// Pretrained `FastEmbed` model (requires the `fastembed-embeddings` feature).
    FastEmbed,
}

impl EmbeddingBackend {
    /// Parses a backend string, returning `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "term-weights" | "term_weights" | "tfidf" | "tf-idf" => Some(Self::TermWeights),
            "fastembed" => Some(Self::FastEmbed),
            _ => None,
        }
    }
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    /// Embedder backend.
    pub backend: EmbeddingBackend,
    /// Dimensionality of the term-weight embedder.
    pub dimensions: usize,
    /// Model name for the `FastEmbed` backend.
    pub model: String,
    /// One-document-per-line corpus used to fit term weights on first use.
    pub bootstrap_corpus: Option<PathBuf>,
    /// Whether English stop words are removed before weighting.
    pub stop_words: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::TermWeights,
            dimensions: DEFAULT_DIMENSIONS,
            model: "bge-base-en-v1.5".to_string(),
            bootstrap_corpus: None,
            stop_words: true,
        }
    }
}

/// What to do when the stored index was built by a different embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingChangePolicy {
    /// Refuse to open the index.
    #[default]
    Reject,
    /// Re-embed every stored document with the current embedder.
    Reembed,
}

impl EmbeddingChangePolicy {
    /// Parses a policy string, returning `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "reembed" | "re-embed" => Some(Self::Reembed),
            _ => None,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSettings {
    /// Whether inserting an existing id overwrites it.
    pub allow_upsert: bool,
    /// Behaviour when the embedding fingerprint changed.
    pub on_embedding_change: EmbeddingChangePolicy,
    /// How record ids are derived from papers.
    pub id_strategy: IdStrategy,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            allow_upsert: true,
            on_embedding_change: EmbeddingChangePolicy::Reject,
            id_strategy: IdStrategy::Title,
        }
    }
}

/// LLM provider configuration.
///
/// Any OpenAI-compatible chat completions endpoint works; the defaults
/// target Groq.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name.
    pub model: String,
    /// Base URL of the chat completions API.
    pub base_url: String,
    /// API key.
    pub api_key: Option<SecretString>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in a completion.
    pub max_tokens: u32,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "mixtral-8x7b-32768".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 4096,
            timeout_ms: None,
            connect_timeout_ms: None,
        }
    }
}

/// Logging settings as written in the config file.
///
/// Resolved against the environment by
/// [`LoggingConfig::from_settings`](crate::observability::LoggingConfig::from_settings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `paperlens=debug`.
    pub filter: Option<String>,
    /// Optional log file; logs go to stderr otherwise.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Collection name.
    pub collection: Option<String>,
    /// Embedding section.
    pub embedding: Option<ConfigFileEmbedding>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Embedding section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEmbedding {
    /// Backend name.
    pub backend: Option<String>,
    /// Dimensions.
    pub dimensions: Option<usize>,
    /// Model name.
    pub model: Option<String>,
    /// Bootstrap corpus path.
    pub bootstrap_corpus: Option<String>,
    /// Stop word removal.
    pub stop_words: Option<bool>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Upsert toggle.
    pub allow_upsert: Option<bool>,
    /// Embedding change policy.
    pub on_embedding_change: Option<String>,
    /// Id strategy.
    pub id_strategy: Option<String>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Model name.
    pub model: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Temperature.
    pub temperature: Option<f32>,
    /// Max tokens.
    pub max_tokens: Option<u32>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Format.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file.
    pub file: Option<String>,
}

impl Default for PaperlensConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            collection: DEFAULT_COLLECTION.to_string(),
            embedding: EmbeddingSettings::default(),
            storage: StorageSettings::default(),
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl PaperlensConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or names an unknown enum value.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/paperlens/` on macOS)
    /// 2. XDG config dir (`~/.config/paperlens/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("paperlens").join("config.toml");
        if platform_config.exists() {
            match Self::load_from_file(&platform_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(
                    path = %platform_config.display(),
                    error = %e,
                    "Ignoring unreadable config file"
                ),
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("paperlens")
            .join("config.toml");
        if xdg_config.exists() {
            match Self::load_from_file(&xdg_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(
                    path = %xdg_config.display(),
                    error = %e,
                    "Ignoring unreadable config file"
                ),
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `PaperlensConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(collection) = file.collection {
            config.collection = collection;
        }
        if let Some(embedding) = file.embedding {
            if let Some(backend) = embedding.backend {
                config.embedding.backend = EmbeddingBackend::parse(&backend).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown embedding backend '{backend}'"))
                })?;
            }
            if let Some(dimensions) = embedding.dimensions {
                config.embedding.dimensions = dimensions;
            }
            if let Some(model) = embedding.model {
                config.embedding.model = model;
            }
            config.embedding.bootstrap_corpus = embedding.bootstrap_corpus.map(PathBuf::from);
            if let Some(stop_words) = embedding.stop_words {
                config.embedding.stop_words = stop_words;
            }
        }
        if let Some(storage) = file.storage {
            if let Some(allow_upsert) = storage.allow_upsert {
                config.storage.allow_upsert = allow_upsert;
            }
            if let Some(policy) = storage.on_embedding_change {
                config.storage.on_embedding_change = EmbeddingChangePolicy::parse(&policy)
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("unknown on_embedding_change '{policy}'"))
                    })?;
            }
            if let Some(strategy) = storage.id_strategy {
                config.storage.id_strategy = IdStrategy::parse(&strategy).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown id_strategy '{strategy}'"))
                })?;
            }
        }
        if let Some(llm) = file.llm {
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(base_url) = llm.base_url {
                config.llm.base_url = base_url;
            }
            config.llm.api_key = llm.api_key.map(SecretString::from);
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            config.llm.timeout_ms = llm.timeout_ms;
            config.llm.connect_timeout_ms = llm.connect_timeout_ms;
        }
        if let Some(logging) = file.logging {
            config.logging = LoggingSettings {
                format: logging.format,
                filter: logging.filter,
                file: logging.file.map(PathBuf::from),
            };
        }

        Ok(config)
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(data_dir) = var("PAPERLENS_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(collection) = var("PAPERLENS_COLLECTION") {
            self.collection = collection;
        }
        if let Some(dimensions) = var("PAPERLENS_EMBEDDING_DIMENSIONS") {
            match dimensions.parse::<usize>() {
                Ok(dimensions) => self.embedding.dimensions = dimensions,
                Err(_) => tracing::warn!(
                    value = %dimensions,
                    "Ignoring invalid PAPERLENS_EMBEDDING_DIMENSIONS"
                ),
            }
        }
        if let Some(key) = var("PAPERLENS_LLM_API_KEY").or_else(|| var("GROQ_API_KEY")) {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = var("PAPERLENS_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = var("PAPERLENS_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(format) = var("PAPERLENS_LOG_FORMAT") {
            self.logging.format = Some(format);
        }

        self
    }

    /// Checks values that would otherwise fail deep inside the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty collection name or zero dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(Error::InvalidInput(
                "collection name must not be empty".to_string(),
            ));
        }
        if self.embedding.backend == EmbeddingBackend::TermWeights && self.embedding.dimensions == 0
        {
            return Err(Error::InvalidInput(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the `SQLite` database.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the collection name.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the term-weight embedding dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding.dimensions = dimensions;
        self
    }

    /// Sets the storage settings.
    #[must_use]
    pub const fn with_storage(mut self, storage: StorageSettings) -> Self {
        self.storage = storage;
        self
    }
}
