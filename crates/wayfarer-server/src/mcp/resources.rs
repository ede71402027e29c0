// crates/wayfarer-server/src/mcp/resources.rs
// MCP Resource handlers: read-only views of adapter state

use super::AdapterServer;
use crate::dispatch::{Adapter, ResourceDescriptor};
use rmcp::{
    model::{
        Annotated, ListResourcesResult, PaginatedRequestParams, RawResource,
        ReadResourceRequestParams, ReadResourceResult, ResourceContents,
    },
    service::{RequestContext, RoleServer},
};

fn to_resource(descriptor: &ResourceDescriptor) -> Annotated<RawResource> {
    Annotated::new(
        RawResource {
            uri: descriptor.uri.clone(),
            name: descriptor.name.clone(),
            title: Some(descriptor.title.clone()),
            description: Some(descriptor.description.clone()),
            mime_type: Some(descriptor.mime_type.clone()),
            size: None,
            icons: None,
            meta: None,
        },
        None,
    )
}

impl<A: Adapter> AdapterServer<A> {
    /// Handle `resources/list`.
    pub(super) async fn handle_list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, rmcp::ErrorData> {
        Ok(ListResourcesResult {
            resources: self.resources.iter().map(to_resource).collect(),
            next_cursor: None,
            meta: None,
        })
    }

    /// Handle `resources/read`.
    pub(super) async fn handle_read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, rmcp::ErrorData> {
        let uri = request.uri;
        let mime_type = self
            .resources
            .iter()
            .find(|r| r.uri == uri)
            .map(|r| r.mime_type.clone());

        let text = self
            .dispatcher
            .lock()
            .await
            .read_resource(&uri)
            .await
            .map_err(|e| {
                rmcp::ErrorData::internal_error(format!("Failed to read {uri}: {e}"), None)
            })?;

        match text {
            Some(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri,
                    mime_type,
                    text,
                    meta: None,
                }],
            }),
            None => Err(rmcp::ErrorData::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            )),
        }
    }
}
