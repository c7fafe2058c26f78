use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use tubescribe_core::{
    mcp_server::{JsonRpcHandler, McpServer},
    transport::StdioTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; RUST_LOG controls verbosity. Logs go to stderr so
    // stdout stays clean for the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting tubescribe MCP server");

    // Create provider registry with only feature-enabled connectors
    let registry = tubescribe_core::build_registry_enabled_only().await;

    // Note: Set the YouTube API key at runtime via auth/youtube/set if the
    // metadata tools are needed.

    let registry = Arc::new(Mutex::new(registry));

    // Create MCP server
    let server = McpServer::new(registry);

    // Create JSON-RPC handler
    let handler = JsonRpcHandler::new(server);

    // Create and run stdio transport
    let transport = StdioTransport::new(handler);

    info!("MCP server ready, listening on stdio");

    if let Err(e) = transport.run().await {
        error!("Transport error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
