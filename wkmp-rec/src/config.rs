//! Configuration resolution for wkmp-rec
//!
//! Provides configuration with ENV → TOML priority for API keys and TOML →
//! compiled defaults for everything else. Loaded and validated once at
//! process start, then passed explicitly into the pipeline.

use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use wkmp_common::config::{default_config_path, load_toml_config, resolve_secret};
use wkmp_common::{Error, Result};

/// Module name used for the default TOML path
pub const MODULE_NAME: &str = "wkmp-rec";

/// Environment variable overriding the TOML path
pub const CONFIG_PATH_ENV: &str = "WKMP_REC_CONFIG";

/// Environment variable for the completion/embeddings API key
pub const OPENAI_KEY_ENV: &str = "WKMP_OPENAI_API_KEY";

/// Environment variable for the web search API key
pub const BRAVE_KEY_ENV: &str = "WKMP_BRAVE_API_KEY";

// ============================================================================
// TOML sections
// ============================================================================

/// On-disk shape of `wkmp-rec.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecTomlConfig {
    pub api_keys: ApiKeysConfig,
    pub endpoints: EndpointsConfig,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub openai: Option<String>,
    pub brave: Option<String>,
}

/// Base URLs of the external collaborators
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub openai_base_url: String,
    pub brave_base_url: String,
    pub spotify_base_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            brave_base_url: "https://api.search.brave.com".to_string(),
            spotify_base_url: "https://api.spotify.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub completion: String,
    pub embedding: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            completion: "gpt-4o-mini".to_string(),
            embedding: "text-embedding-3-small".to_string(),
        }
    }
}

/// Pipeline tunables
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Candidates kept after basic scoring (and sent to embedding)
    pub max_candidates_for_embedding: usize,
    /// Catalog lookups in flight per batch
    pub max_concurrent_requests: usize,
    /// Pause between catalog batches
    pub batch_delay_ms: u64,
    /// Skip the embedding re-rank
    pub skip_semantic_similarity: bool,
    /// Skip both the embedding re-rank and the AI verification pass
    pub fast_mode: bool,
    pub web_search_timeout_secs: u64,
    pub completion_timeout_secs: u64,
    pub embedding_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    /// Client-side quota for catalog search
    pub catalog_requests_per_second: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_candidates_for_embedding: 15,
            max_concurrent_requests: 8,
            batch_delay_ms: 100,
            skip_semantic_similarity: false,
            fast_mode: false,
            web_search_timeout_secs: 10,
            completion_timeout_secs: 30,
            embedding_timeout_secs: 15,
            catalog_timeout_secs: 10,
            catalog_requests_per_second: 20,
        }
    }
}

impl PipelineConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn web_search_timeout(&self) -> Duration {
        Duration::from_secs(self.web_search_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    /// Whether the embedding re-rank runs
    pub fn semantic_rerank_enabled(&self) -> bool {
        !self.skip_semantic_similarity && !self.fast_mode
    }

    /// Whether the AI verification pass runs
    pub fn verification_enabled(&self) -> bool {
        !self.fast_mode
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Fully resolved configuration handed to the pipeline
#[derive(Debug, Clone)]
pub struct RecConfig {
    pub openai_api_key: String,
    pub brave_api_key: String,
    pub endpoints: EndpointsConfig,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
}

impl RecConfig {
    /// Configuration with compiled defaults and the given keys
    pub fn new(openai_api_key: impl Into<String>, brave_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            brave_api_key: brave_api_key.into(),
            endpoints: EndpointsConfig::default(),
            models: ModelsConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    /// Resolve the TOML path: explicit argument → `WKMP_REC_CONFIG` → default
    pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        default_config_path(MODULE_NAME)
    }

    /// Load, resolve secrets, and validate
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit_path)?;
        let toml_config: RecTomlConfig = load_toml_config(&path)?;
        let config = Self::from_toml(toml_config)?;
        config.validate()?;
        info!("Configuration loaded (config file: {})", path.display());
        Ok(config)
    }

    /// Resolve API keys against the environment
    pub fn from_toml(toml_config: RecTomlConfig) -> Result<Self> {
        let (openai_api_key, _) =
            resolve_secret(OPENAI_KEY_ENV, toml_config.api_keys.openai.as_deref())
                .ok_or_else(|| missing_key_error("OpenAI", OPENAI_KEY_ENV, "openai"))?;
        let (brave_api_key, _) =
            resolve_secret(BRAVE_KEY_ENV, toml_config.api_keys.brave.as_deref())
                .ok_or_else(|| missing_key_error("Brave Search", BRAVE_KEY_ENV, "brave"))?;

        Ok(Self {
            openai_api_key,
            brave_api_key,
            endpoints: toml_config.endpoints,
            models: toml_config.models,
            pipeline: toml_config.pipeline,
        })
    }

    /// Fail-fast checks run once at startup
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(Error::Config("OpenAI API key is blank".to_string()));
        }
        if self.brave_api_key.trim().is_empty() {
            return Err(Error::Config("Brave Search API key is blank".to_string()));
        }
        for (name, url) in [
            ("openai_base_url", &self.endpoints.openai_base_url),
            ("brave_base_url", &self.endpoints.brave_base_url),
            ("spotify_base_url", &self.endpoints.spotify_base_url),
        ] {
            Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, url, e)))?;
        }
        if self.models.completion.trim().is_empty() || self.models.embedding.trim().is_empty() {
            return Err(Error::Config("Model names must not be blank".to_string()));
        }

        let p = &self.pipeline;
        if p.max_concurrent_requests == 0 {
            return Err(Error::Config("max_concurrent_requests must be > 0".to_string()));
        }
        if p.max_candidates_for_embedding == 0 {
            return Err(Error::Config(
                "max_candidates_for_embedding must be > 0".to_string(),
            ));
        }
        if p.catalog_requests_per_second == 0 {
            return Err(Error::Config(
                "catalog_requests_per_second must be > 0".to_string(),
            ));
        }
        if [
            p.web_search_timeout_secs,
            p.completion_timeout_secs,
            p.embedding_timeout_secs,
            p.catalog_timeout_secs,
        ]
        .contains(&0)
        {
            return Err(Error::Config("Timeouts must be > 0 seconds".to_string()));
        }
        Ok(())
    }
}

fn missing_key_error(service: &str, env_var: &str, toml_key: &str) -> Error {
    Error::Config(format!(
        "{} API key not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: ~/.config/wkmp/{}.toml ([api_keys] {} = \"your-key\")",
        service, env_var, MODULE_NAME, toml_key
    ))
}
