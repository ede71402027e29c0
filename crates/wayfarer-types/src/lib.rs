// crates/wayfarer-types/src/lib.rs
// Shared protocol types for the Wayfarer tool adapters
// Serde only: no runtime or vendor dependencies allowed here

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of entries kept in `ContextRecord::recent_actions`.
pub const MAX_RECENT_ACTIONS: usize = 50;

// ═══════════════════════════════════════
// SCHEMA CATALOGUE
// ═══════════════════════════════════════

/// Primitive type of a declared input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Any JSON value, including null
    Any,
}

impl FieldType {
    /// JSON Schema `type` keyword, `None` for `Any`
    pub fn json_type(self) -> Option<&'static str> {
        match self {
            FieldType::String => Some("string"),
            FieldType::Integer => Some("integer"),
            FieldType::Number => Some("number"),
            FieldType::Boolean => Some("boolean"),
            FieldType::Object => Some("object"),
            FieldType::Array => Some("array"),
            FieldType::Any => None,
        }
    }

    /// Whether `value` is an instance of this type
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Any => true,
        }
    }
}

/// One field of an operation's input shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub required: bool,
    pub description: String,
}

impl FieldSpec {
    pub fn required(name: &str, kind: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, kind: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            description: description.to_string(),
        }
    }
}

/// Static description of one operation exposed by an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub input_shape: Vec<FieldSpec>,
}

impl OperationDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.input_shape.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.input_shape.iter().filter(|f| f.required)
    }
}

// ═══════════════════════════════════════
// INVOCATION
// ═══════════════════════════════════════

/// A single "invoke operation" request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(operation: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            operation: operation.into(),
            arguments,
        }
    }
}

/// Typed payload part of a result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        /// Base64-encoded image bytes
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::Image { .. } => None,
        }
    }
}

/// Uniform success/error wrapper returned for every invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub content: Vec<ContentPart>,
    pub is_error: bool,
}

impl ResultEnvelope {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn image(data: String, mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Image {
                data,
                mime_type: mime_type.into(),
            }],
            is_error: false,
        }
    }

    /// Error envelope; the message is prefixed with `Error: `
    pub fn error(message: impl AsRef<str>) -> Self {
        Self {
            content: vec![ContentPart::Text {
                text: format!("Error: {}", message.as_ref()),
            }],
            is_error: true,
        }
    }

    /// Text of the first text part, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentPart::as_text)
    }
}

// ═══════════════════════════════════════
// SHARED CONTEXT
// ═══════════════════════════════════════

/// One entry of the recent-actions log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAction {
    pub action: String,
    #[serde(default)]
    pub details: Option<Value>,
    pub timestamp: String,
}

/// Persistent document shared between processes through the context adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    #[serde(default)]
    pub current_user: Option<Value>,
    #[serde(default)]
    pub current_page: Option<String>,
    #[serde(default)]
    pub recent_actions: Vec<RecentAction>,
    #[serde(default)]
    pub application_state: Map<String, Value>,
    pub timestamp: String,
}

impl ContextRecord {
    /// Empty document stamped with `timestamp`
    pub fn empty(timestamp: impl Into<String>) -> Self {
        Self {
            current_user: None,
            current_page: None,
            recent_actions: Vec::new(),
            application_state: Map::new(),
            timestamp: timestamp.into(),
        }
    }

    /// Prepend an action, evicting the oldest entries beyond the cap
    pub fn push_action(&mut self, action: RecentAction) {
        self.recent_actions.insert(0, action);
        self.recent_actions.truncate(MAX_RECENT_ACTIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::Integer.accepts(&json!(5000)));
        assert!(!FieldType::Integer.accepts(&json!(50.5)));
        assert!(FieldType::Number.accepts(&json!(50.5)));
        assert!(!FieldType::String.accepts(&json!(1)));
        assert!(FieldType::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let descriptor = OperationDescriptor {
            name: "get_customer".to_string(),
            description: "Fetch a customer".to_string(),
            input_shape: vec![FieldSpec::required("customer_id", FieldType::String, "Customer ID")],
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["inputShape"][0]["type"], "string");
        assert_eq!(value["inputShape"][0]["required"], true);
    }

    #[test]
    fn test_error_envelope_prefix() {
        let envelope = ResultEnvelope::error("card declined");
        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), Some("Error: card declined"));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");
    }

    #[test]
    fn test_push_action_caps_log() {
        let mut record = ContextRecord::empty("t0");
        for i in 0..60 {
            record.push_action(RecentAction {
                action: format!("action-{i}"),
                details: None,
                timestamp: format!("t{i}"),
            });
        }
        assert_eq!(record.recent_actions.len(), MAX_RECENT_ACTIONS);
        assert_eq!(record.recent_actions[0].action, "action-59");
        assert_eq!(record.recent_actions[49].action, "action-10");
    }

    #[test]
    fn test_context_record_defaults_missing_fields() {
        let record: ContextRecord = serde_json::from_str(r#"{"timestamp": "now"}"#).unwrap();
        assert_eq!(record, ContextRecord::empty("now"));
    }
}
