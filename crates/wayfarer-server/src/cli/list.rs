// crates/wayfarer-server/src/cli/list.rs
// Print an adapter's tool catalogue

use anyhow::Result;
use serde_json::{Value, json};
use wayfarer::adapters::AdapterKind;
use wayfarer::catalogue;

/// Print the catalogue as a JSON array of `{name, description, inputSchema}`.
///
/// Needs no credentials: the catalogue is static.
pub fn run_list(kind: AdapterKind) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&catalogue_json(kind))?);
    Ok(())
}

fn catalogue_json(kind: AdapterKind) -> Value {
    let tools: Vec<Value> = kind
        .catalogue()
        .descriptors()
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "description": d.description,
                "inputSchema": catalogue::input_schema(d),
            })
        })
        .collect();
    Value::Array(tools)
}
