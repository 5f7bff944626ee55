//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `APPRAISAL_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_TEMPERATURE};
use crate::pipeline::PipelineConfig;
use crate::queue::QueueConfig;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `APPRAISAL_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory where uploaded documents are written. Default: `./.data/uploads`.
    pub storage_path: PathBuf,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Qdrant collection holding the retrieval corpus. Default: `appraisal_context`.
    pub collection: String,

    /// Number of queue workers. Default: `3`.
    pub worker_count: usize,

    /// Queue buffer capacity. Default: `100`.
    pub queue_capacity: usize,

    /// How long `enqueue` waits for buffer space. Default: `5s`.
    pub enqueue_timeout: Duration,

    /// Deadline for one pipeline run. Default: `300s`.
    pub job_timeout: Duration,

    /// Total attempts for result/terminal-status writes. Default: `3`.
    pub persist_attempts: u32,

    /// Total attempts for transient retriever/scorer failures. Default: `1`.
    pub collaborator_attempts: u32,

    /// Model name passed to the LLM provider. Default: `gemini-2.0-flash`.
    pub llm_model: String,

    /// Sampling temperature for model calls. Default: `0.2`.
    pub llm_temperature: f64,

    /// Maximum tokens per model reply. Default: `1024`.
    pub llm_max_tokens: u32,

    /// OpenAI-compatible embeddings endpoint.
    pub embedding_url: String,

    /// Embedding model name.
    pub embedding_model: String,

    /// Embedding dimension (Qdrant vector size). Default: `768`.
    pub embedding_dim: usize,

    /// Use deterministic in-process scorer and embedder instead of remote providers.
    pub mock_provider: bool,
}

/// Default Qdrant URL used when `APPRAISAL_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default collection name used when `APPRAISAL_COLLECTION` is not set.
pub const DEFAULT_COLLECTION: &str = "appraisal_context";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: PathBuf::from("./.data/uploads"),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            worker_count: 3,
            queue_capacity: 100,
            enqueue_timeout: Duration::from_secs(5),
            job_timeout: Duration::from_secs(300),
            persist_attempts: 3,
            collaborator_attempts: 1,
            llm_model: "gemini-2.0-flash".to_string(),
            llm_temperature: DEFAULT_LLM_TEMPERATURE,
            llm_max_tokens: DEFAULT_LLM_MAX_TOKENS,
            embedding_url: "http://localhost:11434/v1/embeddings".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            mock_provider: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "APPRAISAL_PORT";
    const ENV_BIND_ADDR: &'static str = "APPRAISAL_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "APPRAISAL_STORAGE_PATH";
    const ENV_QDRANT_URL: &'static str = "APPRAISAL_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "APPRAISAL_COLLECTION";
    const ENV_WORKER_COUNT: &'static str = "APPRAISAL_WORKER_COUNT";
    const ENV_QUEUE_CAPACITY: &'static str = "APPRAISAL_QUEUE_CAPACITY";
    const ENV_ENQUEUE_TIMEOUT_SECS: &'static str = "APPRAISAL_ENQUEUE_TIMEOUT_SECS";
    const ENV_JOB_TIMEOUT_SECS: &'static str = "APPRAISAL_JOB_TIMEOUT_SECS";
    const ENV_PERSIST_ATTEMPTS: &'static str = "APPRAISAL_PERSIST_ATTEMPTS";
    const ENV_COLLABORATOR_ATTEMPTS: &'static str = "APPRAISAL_COLLABORATOR_ATTEMPTS";
    const ENV_LLM_MODEL: &'static str = "APPRAISAL_LLM_MODEL";
    const ENV_LLM_TEMPERATURE: &'static str = "APPRAISAL_LLM_TEMPERATURE";
    const ENV_LLM_MAX_TOKENS: &'static str = "APPRAISAL_LLM_MAX_TOKENS";
    const ENV_EMBEDDING_URL: &'static str = "APPRAISAL_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "APPRAISAL_EMBEDDING_MODEL";
    const ENV_EMBEDDING_DIM: &'static str = "APPRAISAL_EMBEDDING_DIM";
    const ENV_MOCK_PROVIDER: &'static str = "APPRAISAL_MOCK_PROVIDER";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let worker_count =
            Self::parse_number_from_env(Self::ENV_WORKER_COUNT, defaults.worker_count as u64)?
                as usize;
        let queue_capacity =
            Self::parse_number_from_env(Self::ENV_QUEUE_CAPACITY, defaults.queue_capacity as u64)?
                as usize;
        let enqueue_timeout = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_ENQUEUE_TIMEOUT_SECS,
            defaults.enqueue_timeout.as_secs(),
        )?);
        let job_timeout = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_JOB_TIMEOUT_SECS,
            defaults.job_timeout.as_secs(),
        )?);
        let persist_attempts = Self::parse_number_from_env(
            Self::ENV_PERSIST_ATTEMPTS,
            defaults.persist_attempts as u64,
        )? as u32;
        let collaborator_attempts = Self::parse_number_from_env(
            Self::ENV_COLLABORATOR_ATTEMPTS,
            defaults.collaborator_attempts as u64,
        )? as u32;
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);
        let llm_temperature =
            Self::parse_decimal_from_env(Self::ENV_LLM_TEMPERATURE, defaults.llm_temperature)?;
        let llm_max_tokens = Self::parse_number_from_env(
            Self::ENV_LLM_MAX_TOKENS,
            defaults.llm_max_tokens as u64,
        )? as u32;
        let embedding_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_dim =
            Self::parse_number_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim as u64)?
                as usize;
        let mock_provider = Self::parse_flag_from_env(Self::ENV_MOCK_PROVIDER);

        Ok(Self {
            port,
            bind_addr,
            storage_path,
            qdrant_url,
            collection,
            worker_count,
            queue_capacity,
            enqueue_timeout,
            job_timeout,
            persist_attempts,
            collaborator_attempts,
            llm_model,
            llm_temperature,
            llm_max_tokens,
            embedding_url,
            embedding_model,
            embedding_dim,
            mock_provider,
        })
    }

    /// Validates paths and numeric invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        let positives: [(&'static str, bool); 7] = [
            (Self::ENV_LLM_MAX_TOKENS, self.llm_max_tokens > 0),
            (Self::ENV_WORKER_COUNT, self.worker_count > 0),
            (Self::ENV_QUEUE_CAPACITY, self.queue_capacity > 0),
            (Self::ENV_ENQUEUE_TIMEOUT_SECS, !self.enqueue_timeout.is_zero()),
            (Self::ENV_JOB_TIMEOUT_SECS, !self.job_timeout.is_zero()),
            (Self::ENV_COLLABORATOR_ATTEMPTS, self.collaborator_attempts > 0),
            (Self::ENV_EMBEDDING_DIM, self.embedding_dim > 0),
        ];
        if let Some((name, _)) = positives.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::MustBePositive { name: *name });
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::InvalidTemperature {
                value: self.llm_temperature,
            });
        }

        if self.persist_attempts < 2 {
            return Err(ConfigError::TooFewPersistAttempts {
                value: self.persist_attempts,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Queue settings derived from this config.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            worker_count: self.worker_count,
            capacity: self.queue_capacity,
            enqueue_timeout: self.enqueue_timeout,
        }
    }

    /// Pipeline settings derived from this config.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            job_timeout: self.job_timeout,
            persist_attempts: self.persist_attempts,
            collaborator_attempts: self.collaborator_attempts,
            ..PipelineConfig::default()
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_number_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_decimal_from_env(var_name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidDecimal {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_flag_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}
