// crates/wayfarer-server/src/adapters/content.rs
// Content-store adapter: Notion API (program pages, destination databases)

use crate::args::Arguments;
use crate::catalogue::Operation;
use crate::config::ContentCredentials;
use crate::dispatch::{Adapter, Output};
use crate::error::{AdapterError, Result};
use crate::http::{ApiRequest, ApiTransport, HttpTransport};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use strum::{AsRefStr, EnumIter, EnumString};
use wayfarer_types::{FieldSpec, FieldType};

pub const NOTION_API_BASE: &str = "https://api.notion.com/";
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContentOp {
    GetPage,
    GetPageContent,
    QueryDatabase,
    Search,
    GetDatabase,
    CreatePage,
}

impl Operation for ContentOp {
    fn description(self) -> &'static str {
        match self {
            ContentOp::GetPage => "Retrieve a page and its properties.",
            ContentOp::GetPageContent => "Retrieve the child blocks of a page.",
            ContentOp::QueryDatabase => "Query a database with an optional filter and sort specification.",
            ContentOp::Search => "Search the workspace by title, optionally restricted to pages or databases.",
            ContentOp::GetDatabase => "Retrieve a database's schema and metadata.",
            ContentOp::CreatePage => "Create a page in a database with properties and optional content blocks.",
        }
    }

    fn input_shape(self) -> Vec<FieldSpec> {
        use FieldType::*;
        match self {
            ContentOp::GetPage => vec![FieldSpec::required("page_id", String, "Page ID")],
            ContentOp::GetPageContent => vec![
                FieldSpec::required("page_id", String, "Page or block ID"),
                FieldSpec::optional("page_size", Integer, "Maximum number of blocks (max 100)"),
            ],
            ContentOp::QueryDatabase => vec![
                FieldSpec::required("database_id", String, "Database ID"),
                FieldSpec::optional("filter", Object, "Notion filter object"),
                FieldSpec::optional("sorts", Array, "Notion sort objects"),
            ],
            ContentOp::Search => vec![
                FieldSpec::required("query", String, "Text to search for"),
                FieldSpec::optional("filter_type", String, "Restrict to 'page' or 'database'"),
            ],
            ContentOp::GetDatabase => vec![FieldSpec::required("database_id", String, "Database ID")],
            ContentOp::CreatePage => vec![
                FieldSpec::required("database_id", String, "Parent database ID"),
                FieldSpec::required("properties", Object, "Page properties keyed by property name"),
                FieldSpec::optional("children", Array, "Content blocks to append"),
            ],
        }
    }
}

/// Notion call-through
pub struct ContentAdapter<T: ApiTransport = HttpTransport> {
    transport: T,
}

impl ContentAdapter<HttpTransport> {
    pub fn from_credentials(credentials: &ContentCredentials, client: reqwest::Client) -> Result<Self> {
        let transport = HttpTransport::new(client, NOTION_API_BASE)?
            .bearer(&credentials.token)?
            .with_header("notion-version", NOTION_VERSION)?;
        Ok(Self::new(transport))
    }
}

impl<T: ApiTransport> ContentAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, request: ApiRequest) -> Result<Output> {
        Ok(Output::Json(self.transport.send(request).await?))
    }
}

#[async_trait]
impl<T: ApiTransport + 'static> Adapter for ContentAdapter<T> {
    type Op = ContentOp;

    fn name(&self) -> &'static str {
        "content"
    }

    async fn invoke(&mut self, op: ContentOp, args: &Arguments) -> Result<Output> {
        match op {
            ContentOp::GetPage => {
                let id = segment(args.str("page_id")?);
                self.call(ApiRequest::get(format!("v1/pages/{id}"))).await
            }
            ContentOp::GetPageContent => {
                let id = segment(args.str("page_id")?);
                let mut request = ApiRequest::get(format!("v1/blocks/{id}/children"));
                if let Some(size) = args.opt_i64("page_size")? {
                    request = request.query("page_size", size.to_string());
                }
                self.call(request).await
            }
            ContentOp::QueryDatabase => {
                let id = segment(args.str("database_id")?);
                let mut body = Map::new();
                if let Some(filter) = args.opt_object("filter")? {
                    body.insert("filter".to_string(), Value::Object(filter.clone()));
                }
                if let Some(sorts) = args.opt_array("sorts")? {
                    body.insert("sorts".to_string(), Value::Array(sorts.clone()));
                }
                let request = ApiRequest::post(format!("v1/databases/{id}/query")).json(Value::Object(body));
                self.call(request).await
            }
            ContentOp::Search => {
                let mut body = json!({ "query": args.str("query")? });
                if let Some(kind) = args.opt_str("filter_type")? {
                    if kind != "page" && kind != "database" {
                        return Err(AdapterError::invalid_arguments(
                            args.operation(),
                            format!("`filter_type` must be 'page' or 'database', got '{kind}'"),
                        ));
                    }
                    body["filter"] = json!({ "property": "object", "value": kind });
                }
                self.call(ApiRequest::post("v1/search").json(body)).await
            }
            ContentOp::GetDatabase => {
                let id = segment(args.str("database_id")?);
                self.call(ApiRequest::get(format!("v1/databases/{id}"))).await
            }
            ContentOp::CreatePage => {
                let mut body = json!({
                    "parent": { "database_id": args.str("database_id")? },
                    "properties": Value::Object(args.object("properties")?.clone()),
                });
                if let Some(children) = args.opt_array("children")? {
                    body["children"] = Value::Array(children.clone());
                }
                self.call(ApiRequest::post("v1/pages").json(body)).await
            }
        }
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
