// crates/wayfarer-server/src/cli/tool.rs
// Direct tool execution from CLI

use super::with_adapter;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use wayfarer::adapters::AdapterKind;
use wayfarer::config::WayfarerConfig;
use wayfarer::dispatch::{Adapter, Dispatcher};
use wayfarer_types::InvocationRequest;

/// Execute one tool and print its result envelope as JSON.
///
/// Tool failures are part of the envelope (`isError: true`); only bad CLI
/// input or adapter construction make the command itself fail.
pub async fn run_tool(kind: AdapterKind, name: String, args: String) -> Result<()> {
    let arguments = parse_args(&args)?;
    let config = WayfarerConfig::load();
    let request = InvocationRequest::new(name, arguments);
    with_adapter!(kind, &config, |adapter| execute(adapter, request).await)
}

async fn execute<A: Adapter>(adapter: A, request: InvocationRequest) -> Result<()> {
    let mut dispatcher = Dispatcher::new(adapter);
    let envelope = dispatcher.dispatch(request).await;
    dispatcher.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn parse_args(args: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(args).context("tool arguments must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => anyhow::bail!("tool arguments must be a JSON object, got {other}"),
    }
}
