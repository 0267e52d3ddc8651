mod config;
mod content;
mod editor;
mod errors;
mod export;
mod generation;
mod history;
mod layout;
mod llm_client;
mod models;
mod repository;
mod routes;
mod state;
mod surface;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::editor::SessionStore;
use crate::generation::generator::LlmContentGenerator;
use crate::layout::default_layout_config;
use crate::llm_client::LlmClient;
use crate::repository::InMemoryWorksheetRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Worksheet API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and the content generator on top of it
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator = Arc::new(LlmContentGenerator::new(llm));

    let layout_config = default_layout_config();
    info!(
        page_width = layout_config.page_width,
        page_height = layout_config.page_height,
        font = ?layout_config.font,
        initial_pages = config.initial_pages,
        "Layout config loaded"
    );

    let state = AppState {
        config: config.clone(),
        worksheets: Arc::new(InMemoryWorksheetRepository::new()),
        generator,
        sessions: SessionStore::new(),
        layout_config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
