// crates/wayfarer-server/src/dispatch.rs
// Operation dispatcher: name lookup, validation, invocation, envelope shaping

use crate::args::Arguments;
use crate::catalogue::{self, Catalogue, Operation};
use crate::error::{AdapterError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};
use wayfarer_types::{InvocationRequest, ResultEnvelope};

/// Successful handler result, before envelope shaping
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Backend result, pretty-printed into a text part
    Json(Value),
    /// Short human-readable confirmation
    Text(String),
    /// Base64-encoded image
    Image { data: String, mime_type: String },
}

impl Output {
    pub fn text(text: impl Into<String>) -> Self {
        Output::Text(text.into())
    }

    pub fn into_envelope(self) -> ResultEnvelope {
        match self {
            Output::Json(value) => ResultEnvelope::text(
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
            ),
            Output::Text(text) => ResultEnvelope::text(text),
            Output::Image { data, mime_type } => ResultEnvelope::image(data, mime_type),
        }
    }
}

/// A readable resource exposed alongside the tools
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub mime_type: String,
}

/// One backend's operation set and session.
///
/// Handlers get `&mut self`: the dispatcher is the sole owner of the adapter
/// and processes one invocation at a time.
#[async_trait]
pub trait Adapter: Send + 'static {
    type Op: Operation;

    /// Short adapter name ("payments", "browser", ...)
    fn name(&self) -> &'static str;

    /// Perform exactly one backend action
    async fn invoke(&mut self, op: Self::Op, args: &Arguments) -> Result<Output>;

    fn resources(&self) -> Vec<ResourceDescriptor> {
        Vec::new()
    }

    /// Read a resource by URI; `Ok(None)` when the URI is unknown
    async fn read_resource(&mut self, _uri: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Release stateful backend sessions. Best-effort: never fails.
    async fn shutdown(&mut self) {}
}

/// Owns an adapter and turns invocation requests into result envelopes
pub struct Dispatcher<A: Adapter> {
    adapter: A,
    catalogue: Catalogue,
}

impl<A: Adapter> Dispatcher<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            catalogue: Catalogue::of::<A::Op>(),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Handle one invocation. Never fails: errors become `isError` envelopes.
    pub async fn dispatch(&mut self, request: InvocationRequest) -> ResultEnvelope {
        let call_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();
        let operation = request.operation.clone();

        debug!(
            adapter = self.adapter.name(),
            operation = %operation,
            call_id = %call_id,
            "Dispatching operation"
        );

        let result = self.execute(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(
                    adapter = self.adapter.name(),
                    operation = %operation,
                    call_id = %call_id,
                    duration_ms,
                    "Operation succeeded"
                );
                output.into_envelope()
            }
            Err(e) => {
                warn!(
                    adapter = self.adapter.name(),
                    operation = %operation,
                    call_id = %call_id,
                    duration_ms,
                    error = %e,
                    "Operation failed"
                );
                ResultEnvelope::error(e.to_string())
            }
        }
    }

    async fn execute(&mut self, request: InvocationRequest) -> Result<Output> {
        let op: A::Op = request
            .operation
            .parse()
            .map_err(|_| AdapterError::UnknownOperation(request.operation.clone()))?;

        let descriptor = self
            .catalogue
            .get(op.as_ref())
            .ok_or_else(|| AdapterError::UnknownOperation(request.operation.clone()))?;
        catalogue::validate(descriptor, &request.arguments)?;

        let args = Arguments::new(request.operation, request.arguments);
        self.adapter.invoke(op, &args).await
    }

    pub fn resources(&self) -> Vec<ResourceDescriptor> {
        self.adapter.resources()
    }

    pub async fn read_resource(&mut self, uri: &str) -> Result<Option<String>> {
        self.adapter.read_resource(uri).await
    }

    pub async fn shutdown(&mut self) {
        info!(adapter = self.adapter.name(), "Shutting down adapter");
        self.adapter.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use strum::{AsRefStr, EnumIter, EnumString};
    use wayfarer_types::{FieldSpec, FieldType};

    #[derive(Debug, Clone, Copy, EnumString, EnumIter, AsRefStr)]
    #[strum(serialize_all = "snake_case")]
    enum EchoOp {
        Echo,
        Fail,
    }

    impl Operation for EchoOp {
        fn description(self) -> &'static str {
            match self {
                EchoOp::Echo => "Echo the message back",
                EchoOp::Fail => "Always fails",
            }
        }

        fn input_shape(self) -> Vec<FieldSpec> {
            match self {
                EchoOp::Echo => vec![FieldSpec::required("message", FieldType::String, "Message")],
                EchoOp::Fail => vec![],
            }
        }
    }

    #[derive(Default)]
    struct EchoAdapter {
        calls: usize,
        shut_down: bool,
    }

    #[async_trait]
    impl Adapter for EchoAdapter {
        type Op = EchoOp;

        fn name(&self) -> &'static str {
            "echo"
        }

        async fn invoke(&mut self, op: EchoOp, args: &Arguments) -> Result<Output> {
            self.calls += 1;
            match op {
                EchoOp::Echo => Ok(Output::Json(json!({ "message": args.str("message")? }))),
                EchoOp::Fail => Err(AdapterError::backend(Some(409), "duplicate key value")),
            }
        }

        async fn shutdown(&mut self) {
            self.shut_down = true;
        }
    }

    fn request(op: &str, args: Value) -> InvocationRequest {
        InvocationRequest::new(op, args.as_object().cloned().unwrap_or_else(Map::new))
    }

    #[tokio::test]
    async fn test_success_pretty_prints_json() {
        let mut dispatcher = Dispatcher::new(EchoAdapter::default());
        let envelope = dispatcher.dispatch(request("echo", json!({"message": "bonjour"}))).await;
        assert!(!envelope.is_error);
        let text = envelope.first_text().unwrap();
        assert!(text.contains('\n'));
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["message"], "bonjour");
    }

    #[tokio::test]
    async fn test_unknown_operation_names_it() {
        let mut dispatcher = Dispatcher::new(EchoAdapter::default());
        let envelope = dispatcher.dispatch(request("teleport", json!({}))).await;
        assert!(envelope.is_error);
        assert!(envelope.first_text().unwrap().contains("teleport"));
        assert_eq!(dispatcher.adapter().calls, 0);
    }

    #[tokio::test]
    async fn test_validation_runs_before_handler() {
        let mut dispatcher = Dispatcher::new(EchoAdapter::default());
        let envelope = dispatcher.dispatch(request("echo", json!({"message": 7}))).await;
        assert!(envelope.is_error);
        let text = envelope.first_text().unwrap();
        assert!(text.starts_with("Error: Invalid arguments for echo"));
        assert_eq!(dispatcher.adapter().calls, 0);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_envelope() {
        let mut dispatcher = Dispatcher::new(EchoAdapter::default());
        let envelope = dispatcher.dispatch(request("fail", json!({}))).await;
        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), Some("Error: duplicate key value"));
        assert_eq!(envelope.content.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_reaches_adapter() {
        let mut dispatcher = Dispatcher::new(EchoAdapter::default());
        dispatcher.shutdown().await;
        assert!(dispatcher.adapter().shut_down);
    }

    #[test]
    fn test_output_text_envelope() {
        let envelope = Output::text("Context cleared").into_envelope();
        assert_eq!(envelope.first_text(), Some("Context cleared"));
        assert!(!envelope.is_error);
    }
}
