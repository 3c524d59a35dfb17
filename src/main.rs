use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use notes_stream::config::{Cli, Config};
use notes_stream::server::notes_api::{build_router, AppState};
use notes_stream::upstream::openai::OpenAiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "notes_stream=debug,tower_http=debug"
    } else {
        "notes_stream=info,tower_http=info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("notes-stream v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration; the credential only comes from the environment.
    let mut config = Config::from_file_and_env(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    let config = Arc::new(config);

    let client = OpenAiClient::new(&config.upstream)?;

    info!(
        url = client.url(),
        model = %config.upstream.model,
        max_completion_tokens = config.upstream.max_completion_tokens,
        "Upstream configured"
    );

    let state = Arc::new(AppState::new(Arc::new(client), config.clone()));
    let app = build_router(state);

    let listen_addr = config.server.listen.clone();
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
