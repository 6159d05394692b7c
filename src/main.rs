use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use lex_qa::api;
use lex_qa::config::Config;
use lex_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/documents", get(api::documents::list_documents))
        .route("/api/documents", post(api::documents::add_document))
        .route("/api/ask", post(api::ask::ask))
        .route("/api/questions", post(api::questions::suggest_questions))
        .route("/api/config", get(api::documents::get_config))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
