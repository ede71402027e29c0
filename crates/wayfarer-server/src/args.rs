// crates/wayfarer-server/src/args.rs
// Typed accessors over a validated argument mapping

use crate::error::{AdapterError, Result};
use serde_json::{Map, Value};

/// Arguments of one invocation.
///
/// The dispatcher validates against the catalogue before handlers run, so
/// the required accessors only fail when a handler asks for a field its own
/// descriptor does not declare as required.
#[derive(Debug, Clone)]
pub struct Arguments {
    operation: String,
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(operation: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            operation: operation.into(),
            values,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    fn missing(&self, key: &str) -> AdapterError {
        AdapterError::invalid_arguments(
            self.operation.clone(),
            format!("missing required field `{key}`"),
        )
    }

    fn wrong_type(&self, key: &str, expected: &str) -> AdapterError {
        AdapterError::invalid_arguments(
            self.operation.clone(),
            format!("field `{key}` must be of type {expected}"),
        )
    }

    /// Present, non-null value
    pub fn opt_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    /// Required value of any type; an explicit `null` is returned as-is
    pub fn value(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| self.missing(key))
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.wrong_type(key, "string")),
        }
    }

    pub fn str(&self, key: &str) -> Result<&str> {
        self.opt_str(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| self.wrong_type(key, "integer")),
        }
    }

    pub fn i64(&self, key: &str) -> Result<i64> {
        self.opt_i64(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.wrong_type(key, "boolean")),
        }
    }

    pub fn opt_object(&self, key: &str) -> Result<Option<&Map<String, Value>>> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.wrong_type(key, "object")),
        }
    }

    pub fn object(&self, key: &str) -> Result<&Map<String, Value>> {
        self.opt_object(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_array(&self, key: &str) -> Result<Option<&Vec<Value>>> {
        match self.opt_value(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(self.wrong_type(key, "array")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        Arguments::new("test_op", value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_required_string() {
        let a = args(json!({"currency": "usd"}));
        assert_eq!(a.str("currency").unwrap(), "usd");
        let err = a.str("amount").unwrap_err();
        assert!(err.to_string().contains("missing required field `amount`"));
    }

    #[test]
    fn test_null_treated_as_absent() {
        let a = args(json!({"limit": null}));
        assert_eq!(a.opt_i64("limit").unwrap(), None);
        assert!(a.value("limit").unwrap().is_null());
    }

    #[test]
    fn test_wrong_type_reports_expected() {
        let a = args(json!({"limit": "ten"}));
        let err = a.opt_i64("limit").unwrap_err();
        assert!(err.to_string().contains("must be of type integer"));
    }

    #[test]
    fn test_object_and_array() {
        let a = args(json!({"filters": {"status": "active"}, "sorts": []}));
        assert_eq!(a.object("filters").unwrap()["status"], "active");
        assert!(a.opt_array("sorts").unwrap().unwrap().is_empty());
        assert!(a.opt_object("missing").unwrap().is_none());
    }
}
