// src/main.rs

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use gabai::chat::provider::GeminiProvider;
use gabai::chat::ChatService;
use gabai::config::CONFIG;
use gabai::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so CONFIG sees it on first read
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&CONFIG.log_filter)),
        )
        .init();

    info!("Starting GabAI backend");
    info!("Model: {}", CONFIG.gemini_model);
    info!(
        "Generation: temperature {} / max {} output tokens",
        CONFIG.temperature, CONFIG.max_output_tokens
    );

    let provider = Arc::new(GeminiProvider::from_env()?);
    let service = Arc::new(ChatService::new(provider));

    server::run(AppState { service }, &CONFIG.host, CONFIG.port).await
}
