// crates/wayfarer-server/src/cli/serve.rs
// MCP server initialization and main loop

use super::with_adapter;
use anyhow::Result;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{info, warn};
use wayfarer::adapters::AdapterKind;
use wayfarer::config::WayfarerConfig;
use wayfarer::dispatch::Adapter;
use wayfarer::mcp::AdapterServer;

/// Upper bound on adapter cleanup once the server stops
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the MCP server with stdio transport
pub async fn run_mcp_server(kind: AdapterKind) -> Result<()> {
    let config = WayfarerConfig::load();
    with_adapter!(kind, &config, |adapter| serve(adapter).await)
}

async fn serve<A: Adapter>(adapter: A) -> Result<()> {
    let server = AdapterServer::new(adapter);
    info!(
        adapter = server.name(),
        tools = server.tools().len(),
        "Starting MCP server on stdio"
    );

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server.clone(), transport).await?;

    let quit = tokio::select! {
        quit = service.waiting() => Some(quit),
        _ = shutdown_signal() => None,
    };
    finish(&server, quit).await;
    Ok(())
}

/// Log why serving stopped, then release the adapter. `None` means a signal.
async fn finish<A: Adapter, R: std::fmt::Debug>(
    server: &AdapterServer<A>,
    quit: Option<std::result::Result<R, JoinError>>,
) {
    match quit {
        Some(Ok(reason)) => info!(?reason, "MCP client disconnected"),
        Some(Err(e)) => warn!(error = %e, "MCP service task failed"),
        None => info!("Shutdown signal received"),
    }

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, server.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Adapter shutdown timed out"
        );
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use wayfarer::adapters::ContextAdapter;
    use wayfarer::mcp::SHUTTING_DOWN;
    use wayfarer_types::InvocationRequest;

    #[tokio::test]
    async fn test_failed_service_task_still_shuts_adapter_down() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ContextAdapter::open(dir.path().join("ctx.json")).await.unwrap();
        let server = AdapterServer::new(adapter);

        let quit: std::result::Result<(), JoinError> =
            tokio::spawn(async { panic!("service task crashed") }).await;
        assert!(quit.is_err());
        finish(&server, Some(quit)).await;

        let envelope = server.call(InvocationRequest::new("get_context", Map::new())).await;
        assert_eq!(envelope.first_text(), Some(format!("Error: {SHUTTING_DOWN}").as_str()));
    }
}
