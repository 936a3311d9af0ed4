use crate::llm::{DEFAULT_AZURE_API_VERSION, LlmSettings, Provider};
use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File read when no `--config` is given and it exists.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory for uploaded documents
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Require JWT authentication
    #[arg(long, env = "JWT_REQUIRED")]
    pub jwt_required: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt_required: bool,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// Username to lowercase hex SHA-256 of the password, for token login.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Rank with local embeddings; term overlap when off or unavailable.
    pub embeddings: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 120)?
            .set_default("security.jwt_required", false)?
            .set_default("security.jwt_secret", "change-me")?
            .set_default("security.token_ttl_minutes", 30)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("storage.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("retrieval.chunk_size", 1000)?
            .set_default("retrieval.chunk_overlap", 200)?
            .set_default("retrieval.top_k", 5)?
            .set_default("retrieval.embeddings", true)?
            .set_default("logging.json", false)?;

        // An explicit file must exist; the default one is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml))
            }
            None => builder,
        };

        // E.g. NOTEBOOK__SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("NOTEBOOK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(dir) = &cli.upload_dir {
            builder = builder.set_override("storage.upload_dir", dir.to_string_lossy().as_ref())?;
        }
        if let Some(required) = cli.jwt_required {
            builder = builder.set_override("security.jwt_required", required)?;
        }

        builder.build()?.try_deserialize()
    }
}

pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let base_url = std::env::var("LLM_BASE_URL")
        .map_err(|_| "Missing required env var: LLM_BASE_URL".to_string())?;
    if base_url.trim().is_empty() {
        return Err("LLM_BASE_URL cannot be empty".to_string());
    }

    let model = std::env::var("LLM_MODEL")
        .map_err(|_| "Missing required env var: LLM_MODEL".to_string())?;
    if model.trim().is_empty() {
        return Err("LLM_MODEL cannot be empty".to_string());
    }

    let api_key = std::env::var("LLM_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let mut provider = Provider::detect_from_url(&base_url);

    // Azure needs the deployment in the URL
    if let Provider::AzureOpenAI { .. } = &provider {
        if let Ok(deployment) = std::env::var("AZURE_DEPLOYMENT_NAME") {
            provider = Provider::AzureOpenAI {
                deployment_name: deployment,
                api_version: std::env::var("AZURE_API_VERSION")
                    .unwrap_or_else(|_| DEFAULT_AZURE_API_VERSION.to_string()),
            };
        }
    }

    let max_tokens = std::env::var("LLM_MAX_TOKENS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
        max_tokens,
    })
}
