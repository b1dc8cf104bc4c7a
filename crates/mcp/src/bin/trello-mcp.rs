// Standalone MCP server binary

use anyhow::Result;
use std::sync::Arc;
use trello_mcp::tools::{register_trello_tools, ToolRegistry};
use trello_mcp::{McpConfig, McpServer, TrelloSession};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Trello MCP Server starting...");

    let config = McpConfig::from_env()?;
    let client = config.build_client()?;

    let rate_limit = &client.config().rate_limit;
    tracing::info!(
        api_key_capacity = rate_limit.api_key.capacity,
        token_capacity = rate_limit.token.capacity,
        window_ms = rate_limit.token.window.as_millis() as u64,
        policy = ?rate_limit.policy,
        "Rate limiter configured"
    );

    let session = Arc::new(TrelloSession::with_defaults(
        client,
        config.trello.board_id.clone(),
        config.trello.workspace_id.clone(),
    ));

    let mut registry = ToolRegistry::new();
    register_trello_tools(&mut registry, session);

    tracing::info!("Registered {} tools", registry.len());

    let server = Arc::new(McpServer::new(registry));
    server.start().await?;

    Ok(())
}
