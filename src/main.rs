use std::sync::Arc;

use aiarchives_mcp::{
    archive_client::HttpArchiver,
    build_app,
    config::Config,
    domain::tools::SAVE_CONVERSATION,
    http::handlers::{HEALTH_PATH, MCP_PATH},
    logging,
    mcp::server::{Dispatcher, SERVER_NAME},
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let archiver = HttpArchiver::from_config(&config)?;
    let archive_endpoint = archiver.endpoint().clone();

    let dispatcher = Dispatcher::new(Arc::new(archiver), config.model_label.clone());
    let bind_socket = config.bind_socket()?;
    let state = AppState::new(dispatcher);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        server = SERVER_NAME,
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        mcp_path = MCP_PATH,
        health_path = HEALTH_PATH,
        archive_endpoint = %archive_endpoint,
        model_label = %config.model_label,
        tools = SAVE_CONVERSATION,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
