// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use docassist::config::Config;
use docassist::routes;
use docassist::services::{
    credentials::JsonFileStore, extraction::CommandExtractor, llm::OpenAiGateway,
};
use docassist::state::AppState;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let llm = OpenAiGateway::from_config(&config)?;
    tracing::info!(model = %config.llm_model, base_url = %config.openai_base_url, "Language model gateway ready");

    let users = JsonFileStore::open(&config.users_file).await?;

    let state = AppState {
        llm: Arc::new(llm),
        extractor: Arc::new(CommandExtractor::from_config(&config)),
        users: Arc::new(users),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}
