// crates/wayfarer-server/src/adapters/store.rs
// Structured-store adapter: Supabase PostgREST and the admin auth API

use crate::args::Arguments;
use crate::catalogue::Operation;
use crate::config::StoreCredentials;
use crate::dispatch::{Adapter, Output};
use crate::error::{AdapterError, Result};
use crate::http::{ApiRequest, ApiTransport, HttpTransport};
use async_trait::async_trait;
use serde_json::{Map, Value};
use strum::{AsRefStr, EnumIter, EnumString};
use wayfarer_types::{FieldSpec, FieldType};

/// Ask PostgREST to return the affected rows
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOp {
    QueryTable,
    InsertData,
    UpdateData,
    DeleteData,
    GetUser,
}

impl Operation for StoreOp {
    fn description(self) -> &'static str {
        match self {
            StoreOp::QueryTable => {
                "Read rows from a table. Filters are column/value equality checks combined with AND."
            }
            StoreOp::InsertData => "Insert one row (object) or several rows (array of objects). Returns the inserted rows.",
            StoreOp::UpdateData => "Update rows matching all filters. Returns the updated rows.",
            StoreOp::DeleteData => "Delete rows matching all filters. Returns the deleted rows.",
            StoreOp::GetUser => "Look up an authenticated user by ID.",
        }
    }

    fn input_shape(self) -> Vec<FieldSpec> {
        use FieldType::*;
        let table = FieldSpec::required("table", String, "Table name");
        match self {
            StoreOp::QueryTable => vec![
                table,
                FieldSpec::optional("select", String, "Columns to return, comma separated (default *)"),
                FieldSpec::optional("filters", Object, "Column/value equality filters"),
                FieldSpec::optional("limit", Integer, "Maximum number of rows"),
            ],
            StoreOp::InsertData => vec![
                table,
                FieldSpec::required("data", Any, "Row object or array of row objects"),
            ],
            StoreOp::UpdateData => vec![
                table,
                FieldSpec::required("filters", Object, "Column/value equality filters"),
                FieldSpec::required("data", Object, "Columns to set"),
            ],
            StoreOp::DeleteData => vec![
                table,
                FieldSpec::required("filters", Object, "Column/value equality filters"),
            ],
            StoreOp::GetUser => vec![FieldSpec::required("user_id", String, "User ID (UUID)")],
        }
    }
}

/// Supabase call-through
pub struct StoreAdapter<T: ApiTransport = HttpTransport> {
    transport: T,
}

impl StoreAdapter<HttpTransport> {
    pub fn from_credentials(credentials: &StoreCredentials, client: reqwest::Client) -> Result<Self> {
        let transport = HttpTransport::new(client, &credentials.url)?
            .with_header("apikey", &credentials.key)?
            .bearer(&credentials.key)?;
        Ok(Self::new(transport))
    }
}

impl<T: ApiTransport> StoreAdapter<T> {
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
impl<T: ApiTransport + 'static> Adapter for StoreAdapter<T> {
    type Op = StoreOp;

    fn name(&self) -> &'static str {
        "store"
    }

    async fn invoke(&mut self, op: StoreOp, args: &Arguments) -> Result<Output> {
        match op {
            StoreOp::QueryTable => {
                let mut request = ApiRequest::get(table_path(args)?)
                    .query("select", args.opt_str("select")?.unwrap_or("*"));
                if let Some(filters) = args.opt_object("filters")? {
                    for (column, condition) in filter_pairs(args.operation(), filters)? {
                        request = request.query(column, condition);
                    }
                }
                if let Some(limit) = args.opt_i64("limit")? {
                    request = request.query("limit", limit.to_string());
                }
                self.call(request).await
            }
            StoreOp::InsertData => {
                let data = args.value("data")?;
                let rows_ok = match data {
                    Value::Object(_) => true,
                    Value::Array(rows) => !rows.is_empty() && rows.iter().all(Value::is_object),
                    _ => false,
                };
                if !rows_ok {
                    return Err(AdapterError::invalid_arguments(
                        args.operation(),
                        "`data` must be an object or a non-empty array of objects",
                    ));
                }
                let request = ApiRequest::post(table_path(args)?)
                    .header("prefer", RETURN_REPRESENTATION)
                    .json(data.clone());
                self.call(request).await
            }
            StoreOp::UpdateData => {
                let filters = required_filters(args)?;
                let mut request = ApiRequest::patch(table_path(args)?)
                    .header("prefer", RETURN_REPRESENTATION)
                    .json(Value::Object(args.object("data")?.clone()));
                for (column, condition) in filters {
                    request = request.query(column, condition);
                }
                self.call(request).await
            }
            StoreOp::DeleteData => {
                let filters = required_filters(args)?;
                let mut request = ApiRequest::delete(table_path(args)?)
                    .header("prefer", RETURN_REPRESENTATION);
                for (column, condition) in filters {
                    request = request.query(column, condition);
                }
                self.call(request).await
            }
            StoreOp::GetUser => {
                let id = urlencoding::encode(args.str("user_id")?).into_owned();
                self.call(ApiRequest::get(format!("auth/v1/admin/users/{id}"))).await
            }
        }
    }
}

fn table_path(args: &Arguments) -> Result<String> {
    let table = args.str("table")?;
    if table.trim().is_empty() {
        return Err(AdapterError::invalid_arguments(args.operation(), "`table` must not be empty"));
    }
    Ok(format!("rest/v1/{}", urlencoding::encode(table)))
}

/// Filters for a mutation; an empty mapping would touch every row
fn required_filters(args: &Arguments) -> Result<Vec<(String, String)>> {
    let filters = args.object("filters")?;
    if filters.is_empty() {
        return Err(AdapterError::invalid_arguments(
            args.operation(),
            "`filters` must contain at least one column",
        ));
    }
    filter_pairs(args.operation(), filters)
}

/// Query parameters PostgREST reads as options rather than column filters
const RESERVED_PARAMS: &[&str] = &[
    "select",
    "order",
    "limit",
    "offset",
    "on_conflict",
    "columns",
    "and",
    "or",
];

/// Translate column/value pairs into PostgREST equality conditions.
///
/// Only scalar equality is supported: strings, numbers and booleans map to
/// `eq.<value>`, null maps to `is.null`.
pub fn filter_pairs(operation: &str, filters: &Map<String, Value>) -> Result<Vec<(String, String)>> {
    filters
        .iter()
        .map(|(column, value)| {
            if RESERVED_PARAMS.contains(&column.as_str()) {
                return Err(AdapterError::invalid_arguments(
                    operation,
                    format!("cannot filter on `{column}`: it is a reserved query parameter"),
                ));
            }
            let condition = match value {
                Value::String(s) => format!("eq.{s}"),
                Value::Number(n) => format!("eq.{n}"),
                Value::Bool(b) => format!("eq.{b}"),
                Value::Null => "is.null".to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AdapterError::invalid_arguments(
                        operation,
                        format!("filter on `{column}` must be a string, number, boolean or null"),
                    ));
                }
            };
            Ok((column.clone(), condition))
        })
        .collect()
}
