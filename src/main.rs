//! Notebook LLM server entry point.

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::unused_async)]

use std::sync::Arc;

use mimalloc::MiMalloc;
use notebook_llm::config::{AppConfig, load_llm_settings};
use notebook_llm::{server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;
    telemetry::init(config.logging.json);

    let settings = match load_llm_settings() {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    server::start_server(Arc::new(config), settings).await
}
