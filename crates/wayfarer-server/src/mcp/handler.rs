// crates/wayfarer-server/src/mcp/handler.rs
// MCP ServerHandler implementation: protocol lifecycle methods

use super::{AdapterServer, envelope_to_call_result};
use crate::dispatch::Adapter;

use rmcp::{
    ErrorData, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParams, ReadResourceRequestParams, ReadResourceResult,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
};
use wayfarer_types::InvocationRequest;

impl<A: Adapter> ServerHandler for AdapterServer<A> {
    fn get_info(&self) -> ServerInfo {
        let capabilities = if self.resources.is_empty() {
            ServerCapabilities::builder().enable_tools().build()
        } else {
            ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build()
        };

        ServerInfo {
            protocol_version: Default::default(),
            capabilities,
            server_info: rmcp::model::Implementation {
                name: format!("wayfarer-{}", self.name),
                title: Some(format!("Wayfarer {} adapter", self.name)),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Tools for the {} backend. Each tool performs one backend action and returns its result as text.",
                self.name
            )),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tools.as_ref().clone(),
            next_cursor: None,
            meta: None,
        }))
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let invocation =
                InvocationRequest::new(request.name.to_string(), request.arguments.unwrap_or_default());
            let envelope = self.call(invocation).await;
            Ok(envelope_to_call_result(envelope))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn list_resources(
        &self,
        request: Option<PaginatedRequestParams>,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, ErrorData>> + Send + '_ {
        async move { self.handle_list_resources(request, context).await }
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, ErrorData>> + Send + '_ {
        async move { self.handle_read_resource(request, context).await }
    }
}
