//! Stateless request builder and response normalizer for the sideHUSTLE API.
//!
//! # Design
//! `ApiClient` holds only the resolved configuration and carries no mutable
//! state between calls. `build_request` produces an `HttpRequest` (with the
//! auth header already resolved) and `parse_response` turns an
//! `HttpResponse` into a decoded `Payload` or a classified `ApiError`. The
//! round-trip in between belongs to an `HttpExecutor` or to a native host,
//! which keeps this half deterministic.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::endpoints::ApiCall;
use crate::error::ApiError;
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse};

/// Number of body characters embedded in diagnostic error messages.
pub const BODY_PREFIX_CHARS: usize = 100;

/// Payload keys checked, in order, for a server-supplied error message.
pub const ERROR_MESSAGE_KEYS: [&str; 3] = ["message", "error", "detail"];

const JSON_CONTENT_TYPE: &str = "application/json";

/// Caller-side options for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<String>,
    /// Extra headers; these override the default content type.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Returned unchanged for successful responses that are not JSON.
    Text(String),
}

impl Payload {
    /// Shape-check the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::Deserialization(e.to_string())),
            Payload::Text(text) => Err(ApiError::Deserialization(format!(
                "expected a JSON payload, got text: {}",
                body_prefix(&text)
            ))),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Json(_) => None,
            Payload::Text(text) => Some(text),
        }
    }
}

/// Synchronous, stateless client for the sideHUSTLE API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    auth_scheme: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&ClientConfig::new(base_url))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for `path`, attaching `Authorization` when a
    /// non-empty token is given.
    pub fn build_request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        for (name, value) in options.headers {
            set_header(&mut headers, &name, value);
        }
        let token = token.filter(|t| !t.is_empty());
        if let Some(token) = token {
            set_header(&mut headers, "Authorization", format!("{} {token}", self.auth_scheme));
        }

        let request = HttpRequest {
            method: options.method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: options.body,
        };
        debug!(
            method = %request.method,
            url = %request.url,
            authorized = token.is_some(),
            "built request"
        );
        request
    }

    /// Build the request for one of the known endpoints.
    pub fn build(&self, call: ApiCall, token: Option<&str>) -> HttpRequest {
        self.build_request(&call.path, call.options, token)
    }

    /// Normalize a response into a payload or a classified error.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Payload, ApiError> {
        debug!(
            status = response.status,
            content_type = response.header("content-type").unwrap_or(""),
            "received response"
        );
        let result = normalize(response);
        if let Err(err) = &result {
            warn!(error = %err, "request failed");
        }
        result
    }

    /// Normalize and shape-check in one step.
    pub fn parse_as<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        self.parse_response(response)?.decode()
    }
}

fn normalize(response: HttpResponse) -> Result<Payload, ApiError> {
    let declares_json = response
        .header("content-type")
        .map(|value| value.to_ascii_lowercase().contains(JSON_CONTENT_TYPE))
        .unwrap_or(false);

    if !declares_json {
        if response.is_success() {
            return Ok(Payload::Text(response.body));
        }
        return Err(ApiError::Transport {
            status: response.status,
            body_prefix: body_prefix(&response.body),
            status_text: response.status_text,
        });
    }

    let data: Value = match serde_json::from_str(&response.body) {
        Ok(data) => data,
        Err(_) => {
            return Err(ApiError::MalformedResponse {
                status: response.status,
                body_prefix: body_prefix(&response.body),
                status_text: response.status_text,
            })
        }
    };

    if !response.is_success() {
        let message = extract_error_message(&data)
            .unwrap_or_else(|| format!("HTTP error, status {}", response.status));
        return Err(ApiError::Api {
            status: response.status,
            message,
        });
    }

    Ok(Payload::Json(data))
}

/// First `BODY_PREFIX_CHARS` characters of `body`.
pub fn body_prefix(body: &str) -> String {
    body.chars().take(BODY_PREFIX_CHARS).collect()
}

/// Apply the message rules in `ERROR_MESSAGE_KEYS` order; first match wins.
pub fn extract_error_message(data: &Value) -> Option<String> {
    ERROR_MESSAGE_KEYS
        .iter()
        .find_map(|key| message_from(data.get(*key)?))
}

fn message_from(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        // Zero and false count as absent.
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}
