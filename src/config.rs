use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_INDEX_NAME: &str = "documents";
const DEFAULT_EMBEDDER_NAME: &str = "default";
const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHUNK_SIZE: usize = 4000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_SEARCH_LIMIT: usize = 5;
const DEFAULT_SEARCH_MAX_LIMIT: usize = 19;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 8000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the search server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Meilisearch instance holding the hybrid index.
    pub meilisearch_url: String,
    /// Optional master/API key for Meilisearch.
    pub meili_master_key: Option<String>,
    /// Index uid storing vector records.
    pub meilisearch_index: String,
    /// Name of the user-provided embedder registered on the index.
    pub embedder_name: String,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Language model provider used for keyword extraction and summaries.
    pub llm_provider: LlmProvider,
    /// Language model identifier passed to the provider.
    pub llm_model: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// API key for OpenAI-compatible endpoints.
    pub openai_api_key: Option<String>,
    /// Base URL for OpenAI-compatible endpoints.
    pub openai_base_url: String,
    /// Maximum chunk length, measured in [`Config::text_splitter_unit`].
    pub text_splitter_chunk_size: usize,
    /// Overlap carried between adjacent chunks.
    pub text_splitter_chunk_overlap: usize,
    /// How chunk lengths are measured.
    pub text_splitter_unit: ChunkUnit,
    /// Limit applied when a search request omits one.
    pub search_default_limit: usize,
    /// Largest accepted search limit (inclusive).
    pub search_max_limit: usize,
    /// Number of indexing batches that may wait for the background worker.
    pub indexing_queue_capacity: usize,
    /// Timeout applied to every outbound capability request.
    pub request_timeout: Duration,
    /// HTTP server port.
    pub server_port: u16,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Deterministic offline hashing embedder.
    Hash,
}

/// Supported language model backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI chat completions API.
    OpenAI,
}

/// Unit used to measure chunk length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    /// Unicode scalar values.
    Characters,
    /// Tokens of the embedding model's tokenizer.
    Tokens,
}

impl Config {
    /// Emit the non-secret settings as a debug event.
    pub fn log_summary(&self) {
        tracing::debug!(
            meilisearch_url = %self.meilisearch_url,
            index = %self.meilisearch_index,
            embedder = %self.embedder_name,
            server_port = self.server_port,
            embedding_provider = ?self.embedding_provider,
            llm_provider = ?self.llm_provider,
            "Loaded configuration"
        );
    }

    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_provider: EmbeddingProvider = load_env("EMBEDDING_PROVIDER")?
            .parse()
            .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?;
        let llm_provider: LlmProvider = match load_env_optional("LLM_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("LLM_PROVIDER".to_string()))?,
            None => LlmProvider::Ollama,
        };
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        let needs_openai =
            embedding_provider == EmbeddingProvider::OpenAI || llm_provider == LlmProvider::OpenAI;
        if needs_openai && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
        }

        let config = Self {
            meilisearch_url: load_env("MEILISEARCH_URL")?,
            meili_master_key: load_env_optional("MEILI_MASTER_KEY"),
            meilisearch_index: load_env_optional("MEILISEARCH_INDEX")
                .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            embedder_name: load_env_optional("EMBEDDER_NAME")
                .unwrap_or_else(|| DEFAULT_EMBEDDER_NAME.to_string()),
            embedding_provider,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_parsed("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
            llm_provider,
            llm_model: load_env("LLM_MODEL")?,
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            text_splitter_chunk_size: load_parsed("TEXT_SPLITTER_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            text_splitter_chunk_overlap: load_parsed(
                "TEXT_SPLITTER_CHUNK_OVERLAP",
                DEFAULT_CHUNK_OVERLAP,
            )?,
            text_splitter_unit: match load_env_optional("TEXT_SPLITTER_UNIT") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("TEXT_SPLITTER_UNIT".to_string()))?,
                None => ChunkUnit::Characters,
            },
            search_default_limit: load_parsed("SEARCH_DEFAULT_LIMIT", DEFAULT_SEARCH_LIMIT)?,
            search_max_limit: load_parsed("SEARCH_MAX_LIMIT", DEFAULT_SEARCH_MAX_LIMIT)?,
            indexing_queue_capacity: load_parsed(
                "INDEXING_QUEUE_CAPACITY",
                DEFAULT_QUEUE_CAPACITY,
            )?,
            request_timeout: Duration::from_secs(load_parsed(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            server_port: load_parsed("SERVER_PORT", DEFAULT_SERVER_PORT)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        if self.text_splitter_chunk_size == 0 {
            return Err(ConfigError::InvalidValue("TEXT_SPLITTER_CHUNK_SIZE".into()));
        }
        if self.search_max_limit == 0 {
            return Err(ConfigError::InvalidValue("SEARCH_MAX_LIMIT".into()));
        }
        if self.search_default_limit == 0 || self.search_default_limit > self.search_max_limit {
            return Err(ConfigError::InvalidValue("SEARCH_DEFAULT_LIMIT".into()));
        }
        if self.indexing_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("INDEXING_QUEUE_CAPACITY".into()));
        }
        Ok(())
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|value| value.unwrap_or(default))
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "hash" => Ok(Self::Hash),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for ChunkUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "characters" | "chars" => Ok(Self::Characters),
            "tokens" => Ok(Self::Tokens),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Runs before tracing is installed so `RUST_LOG` may come from the dotenv file; call
/// [`Config::log_summary`] once a subscriber exists.
///
/// `ENV_FILE` selects the dotenv file to read (defaults to `.env`); variables already present in
/// the process environment are not overridden.
pub fn init_config() {
    match env::var("ENV_FILE") {
        Ok(path) => {
            dotenvy::from_filename(&path).ok();
        }
        Err(_) => {
            dotenvy::dotenv().ok();
        }
    }
    let config = Config::from_env().expect("Failed to load config from environment");
    CONFIG.set(config).expect("Failed to set config");
}
