// crates/wayfarer-server/src/catalogue.rs
// Schema catalogue: operation descriptors, argument validation, JSON Schema rendering

use crate::error::{AdapterError, Result};
use serde_json::{Map, Value, json};
use std::str::FromStr;
use strum::IntoEnumIterator;
use wayfarer_types::{FieldSpec, FieldType, OperationDescriptor};

/// An adapter's operation set.
///
/// Implemented by a fieldless enum deriving `EnumString`, `EnumIter` and
/// `AsRefStr` with `snake_case` serialization, so the enum variant names are
/// the wire names and the catalogue can never drift from the handlers.
pub trait Operation:
    Copy + Send + Sync + 'static + FromStr + IntoEnumIterator + AsRef<str>
{
    /// Human-readable description shown in `tools/list`
    fn description(self) -> &'static str;

    /// Declared input fields, in display order
    fn input_shape(self) -> Vec<FieldSpec>;

    fn descriptor(self) -> OperationDescriptor {
        OperationDescriptor {
            name: self.as_ref().to_string(),
            description: self.description().to_string(),
            input_shape: self.input_shape(),
        }
    }
}

/// Static, ordered list of operation descriptors for one adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    descriptors: Vec<OperationDescriptor>,
}

impl Catalogue {
    /// Build the catalogue for an operation enum
    pub fn of<O: Operation>() -> Self {
        Self {
            descriptors: O::iter().map(Operation::descriptor).collect(),
        }
    }

    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Check `arguments` against the declared input shape.
///
/// Every required field must be present, and every present field must match
/// its declared type. `null` counts as absent except for `any` fields.
/// All violations are reported together.
pub fn validate(descriptor: &OperationDescriptor, arguments: &Map<String, Value>) -> Result<()> {
    let mut problems = Vec::new();

    for field in &descriptor.input_shape {
        match arguments.get(&field.name) {
            None => {
                if field.required {
                    problems.push(format!("missing required field `{}`", field.name));
                }
            }
            Some(Value::Null) if field.kind != FieldType::Any => {
                if field.required {
                    problems.push(format!("missing required field `{}`", field.name));
                }
            }
            Some(value) => {
                if !field.kind.accepts(value) {
                    let expected = field.kind.json_type().unwrap_or("any");
                    problems.push(format!("field `{}` must be of type {}", field.name, expected));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AdapterError::invalid_arguments(
            descriptor.name.clone(),
            problems.join("; "),
        ))
    }
}

/// Render an input shape as a JSON Schema object
pub fn input_schema(descriptor: &OperationDescriptor) -> Map<String, Value> {
    let mut properties = Map::new();
    for field in &descriptor.input_shape {
        let mut property = Map::new();
        if let Some(ty) = field.kind.json_type() {
            property.insert("type".to_string(), json!(ty));
        }
        property.insert("description".to_string(), json!(field.description));
        properties.insert(field.name.clone(), Value::Object(property));
    }

    let required: Vec<&str> = descriptor.required_fields().map(|f| f.name.as_str()).collect();

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}
