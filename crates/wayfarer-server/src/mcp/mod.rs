// crates/wayfarer-server/src/mcp/mod.rs
// MCP server wrapping one adapter's dispatcher

mod handler;
mod resources;

use crate::catalogue;
use crate::dispatch::{Adapter, Dispatcher, ResourceDescriptor};
use rmcp::model::{CallToolResult, Content, Tool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use wayfarer_types::{ContentPart, InvocationRequest, OperationDescriptor, ResultEnvelope};

pub const SHUTTING_DOWN: &str = "Server is shutting down";

/// MCP server state.
///
/// The transport spawns a task per request; the dispatcher mutex makes them
/// run one at a time, in the order they acquire the lock. Shutdown cancels
/// the running call so the lock is released to the adapter's cleanup.
pub struct AdapterServer<A: Adapter> {
    dispatcher: Arc<Mutex<Dispatcher<A>>>,
    cancel: CancellationToken,
    name: &'static str,
    tools: Arc<Vec<Tool>>,
    resources: Arc<Vec<ResourceDescriptor>>,
}

impl<A: Adapter> Clone for AdapterServer<A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            cancel: self.cancel.clone(),
            name: self.name,
            tools: self.tools.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<A: Adapter> AdapterServer<A> {
    pub fn new(adapter: A) -> Self {
        let dispatcher = Dispatcher::new(adapter);
        let tools = dispatcher
            .catalogue()
            .descriptors()
            .iter()
            .map(tool_for)
            .collect();
        let name = dispatcher.adapter().name();
        let resources = dispatcher.resources();

        Self {
            dispatcher: Arc::new(Mutex::new(dispatcher)),
            cancel: CancellationToken::new(),
            name,
            tools: Arc::new(tools),
            resources: Arc::new(resources),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Names of all registered tools
    pub fn list_tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.to_string()).collect()
    }

    /// Run one invocation through the dispatcher
    pub async fn call(&self, request: InvocationRequest) -> ResultEnvelope {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => ResultEnvelope::error(SHUTTING_DOWN),
            envelope = async { self.dispatcher.lock().await.dispatch(request).await } => envelope,
        }
    }

    /// Abandon any in-flight call, then release backend sessions (browser)
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.dispatcher.lock().await.shutdown().await;
    }
}

/// Render a catalogue entry as an MCP tool
pub fn tool_for(descriptor: &OperationDescriptor) -> Tool {
    Tool::new(
        descriptor.name.clone(),
        descriptor.description.clone(),
        Arc::new(catalogue::input_schema(descriptor)),
    )
}

pub fn envelope_to_call_result(envelope: ResultEnvelope) -> CallToolResult {
    let content: Vec<Content> = envelope
        .content
        .into_iter()
        .map(|part| match part {
            ContentPart::Text { text } => Content::text(text),
            ContentPart::Image { data, mime_type } => Content::image(data, mime_type),
        })
        .collect();

    if envelope.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ContextAdapter;
    use serde_json::{Map, json};

    #[tokio::test]
    async fn test_tools_match_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ContextAdapter::open(dir.path().join("ctx.json")).await.unwrap();
        let server = AdapterServer::new(adapter);

        assert_eq!(server.name(), "context");
        assert_eq!(
            server.list_tool_names(),
            vec![
                "get_context",
                "set_current_user",
                "set_current_page",
                "add_action",
                "set_app_state",
                "clear_context",
            ]
        );

        let add_action = server.tools().iter().find(|t| t.name == "add_action").unwrap();
        assert_eq!(add_action.input_schema.get("required"), Some(&json!(["action"])));
    }

    #[tokio::test]
    async fn test_call_goes_through_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ContextAdapter::open(dir.path().join("ctx.json")).await.unwrap();
        let server = AdapterServer::new(adapter);

        let mut args = Map::new();
        args.insert("page".to_string(), json!("/destinations/kyoto"));
        let envelope = server.call(InvocationRequest::new("set_current_page", args)).await;
        assert!(!envelope.is_error);
        assert_eq!(envelope.first_text(), Some("Current page set to /destinations/kyoto"));
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = ContextAdapter::open(dir.path().join("ctx.json")).await.unwrap();
        let server = AdapterServer::new(adapter);
        server.shutdown().await;

        let envelope = server.call(InvocationRequest::new("get_context", Map::new())).await;
        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), Some(format!("Error: {SHUTTING_DOWN}").as_str()));
    }

    #[test]
    fn test_error_envelope_sets_is_error() {
        let result = envelope_to_call_result(ResultEnvelope::error("Unknown tool: teleport"));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
    }
}
