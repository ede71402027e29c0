// crates/wayfarer-server/src/http.rs
// Shared HTTP client and the transport seam used by the vendor API adapters

use crate::error::{AdapterError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the shared HTTP client with appropriate defaults.
///
/// Created once at startup and handed to the adapter's transport.
pub fn create_shared_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(4)
        .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Request body encodings used by the vendor APIs
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs, in order
    Form(Vec<(String, String)>),
}

/// One vendor API call, relative to the transport's base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Body::Form(pairs);
        self
    }

    /// Value of a query parameter, if present
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a form field, if the body is form-encoded
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            Body::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Sends one API request and returns the decoded JSON body.
///
/// Non-success responses are mapped to `AdapterError::Backend` carrying the
/// vendor's own error message.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// `ApiTransport` over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            client,
            base_url: Url::parse(&normalized)?,
            headers: HeaderMap::new(),
        })
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| AdapterError::Config(format!("invalid value for header {name}: {e}")))?;
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    pub fn bearer(self, token: &str) -> Result<Self> {
        self.with_header("authorization", &format!("Bearer {token}"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let mut url = self.base_url.join(request.path.trim_start_matches('/'))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        debug!(method = %request.method, url = %url, "Sending API request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(self.headers.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(pairs) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_form(&pairs)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = decode_body(&text);

        if !status.is_success() {
            let message = backend_error_message(&body)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(AdapterError::backend(Some(status.as_u16()), message));
        }

        Ok(body)
    }
}

/// Encode pairs as `application/x-www-form-urlencoded`
pub fn encode_form(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}

/// Parse a response body; empty bodies become `null`, non-JSON bodies a string
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Extract the human-readable message from a vendor error body.
///
/// Stripe nests it under `error.message`; PostgREST and Notion use
/// `message`; Supabase auth uses `msg` or `error_description`.
pub fn backend_error_message(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/error/message"),
        body.get("message"),
        body.get("msg"),
        body.get("error_description"),
        body.get("error"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timeout_values() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert_eq!(CONNECT_TIMEOUT, Duration::from_secs(10));
    }

    #[test]
    fn test_base_url_keeps_path() {
        let transport =
            HttpTransport::new(create_shared_client(DEFAULT_TIMEOUT), "https://abc.supabase.co/rest")
                .unwrap();
        let joined = transport.base_url().join("v1/bookings").unwrap();
        assert_eq!(joined.as_str(), "https://abc.supabase.co/rest/v1/bookings");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new(create_shared_client(DEFAULT_TIMEOUT), "not a url").unwrap_err();
        assert!(matches!(err, AdapterError::Url(_)));
    }

    #[test]
    fn test_encode_form_brackets() {
        let pairs = vec![
            ("amount".to_string(), "5000".to_string()),
            ("metadata[program]".to_string(), "semester abroad".to_string()),
        ];
        assert_eq!(
            encode_form(&pairs),
            "amount=5000&metadata%5Bprogram%5D=semester+abroad"
        );
    }

    #[test]
    fn test_stripe_error_message() {
        let body = json!({"error": {"type": "invalid_request_error", "message": "Refund amount ($60.00) is greater than charge amount ($50.00)"}});
        assert_eq!(
            backend_error_message(&body).unwrap(),
            "Refund amount ($60.00) is greater than charge amount ($50.00)"
        );
    }

    #[test]
    fn test_postgrest_error_message() {
        let body = json!({"code": "23505", "message": "duplicate key value violates unique constraint \"bookings_pkey\""});
        assert!(backend_error_message(&body).unwrap().contains("duplicate key"));
    }

    #[test]
    fn test_auth_error_message() {
        assert_eq!(backend_error_message(&json!({"msg": "User not found"})).unwrap(), "User not found");
        assert_eq!(
            backend_error_message(&json!({"error": "invalid_grant", "error_description": "bad token"})).unwrap(),
            "bad token"
        );
    }

    #[test]
    fn test_plain_and_empty_bodies() {
        assert_eq!(backend_error_message(&json!("Bad Gateway")).unwrap(), "Bad Gateway");
        assert_eq!(backend_error_message(&Value::Null), None);
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("<html>"), json!("<html>"));
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("v1/products").query("limit", "10");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query_value("limit"), Some("10"));

        let req = ApiRequest::post("v1/customers").form(vec![("email".into(), "a@b.c".into())]);
        assert_eq!(req.form_value("email"), Some("a@b.c"));
    }
}
