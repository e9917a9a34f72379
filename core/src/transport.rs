//! The I/O half of the request pipeline.
//!
//! # Design
//! `Transport` glues the stateless `ApiClient` to durable storage and an
//! `HttpExecutor`: it reads the current token from storage before every
//! call, builds the request, performs exactly one attempt and normalizes the
//! result. There is no retry, no timeout override and no request coalescing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::client::{ApiClient, Payload, RequestOptions};
use crate::config::ClientConfig;
use crate::endpoints::ApiCall;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::storage::{KeyValueStore, AUTH_TOKEN_KEY};

/// Performs one HTTP round-trip.
///
/// Implementations read the whole body as text exactly once and report any
/// failure below the HTTP layer as `ApiError::Network`. Non-2xx responses
/// are data, not errors.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `HttpExecutor` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Request pipeline shared by the session layer and the domain calls.
#[derive(Clone)]
pub struct Transport {
    client: ApiClient,
    store: Arc<dyn KeyValueStore>,
    executor: Arc<dyn HttpExecutor>,
}

impl Transport {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        executor: Arc<dyn HttpExecutor>,
    ) -> Self {
        Self {
            client: ApiClient::from_config(config),
            store,
            executor,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Perform one request against `path` and normalize the outcome.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Payload, ApiError> {
        let token = self.stored_token().await;
        let request = self.client.build_request(path, options, token.as_deref());
        let response = self.executor.execute(request).await.map_err(|err| {
            warn!(path, error = %err, "request did not complete");
            err
        })?;
        self.client.parse_response(response)
    }

    /// `request` for one of the known endpoints.
    pub async fn send(&self, call: ApiCall) -> Result<Payload, ApiError> {
        self.request(&call.path, call.options).await
    }

    /// The token is always read from storage, never from session memory.
    async fn stored_token(&self) -> Option<String> {
        match self.store.get_item(AUTH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "token lookup failed, sending unauthenticated");
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingStore, ScriptedExecutor};
    use super::*;
    use crate::storage::MemoryStore;

    fn transport(store: Arc<dyn KeyValueStore>, executor: Arc<ScriptedExecutor>) -> Transport {
        Transport::new(&ClientConfig::new("http://api.test/api"), store, executor)
    }

    #[tokio::test]
    async fn token_is_read_from_storage_for_every_call() {
        let store = Arc::new(MemoryStore::new());
        let executor = Arc::new(
            ScriptedExecutor::default()
                .json(200, "[]")
                .json(200, "[]"),
        );
        let transport = transport(store.clone(), executor.clone());

        transport.send(ApiCall::my_posts()).await.unwrap();
        store.set_item(AUTH_TOKEN_KEY, "t0k3n").await.unwrap();
        transport.send(ApiCall::my_posts()).await.unwrap();

        let requests = executor.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].header("Authorization").is_none());
        assert_eq!(requests[1].header("Authorization"), Some("Token t0k3n"));
        assert_eq!(requests[1].url, "http://api.test/api/posts/my_posts/");
    }

    #[tokio::test]
    async fn storage_failure_sends_unauthenticated() {
        let executor = Arc::new(ScriptedExecutor::default().json(200, "{}"));
        let transport = transport(Arc::new(FailingStore::all()), executor.clone());
        transport.send(ApiCall::current_user()).await.unwrap();
        assert!(executor.requests()[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn network_errors_pass_through_unwrapped() {
        let executor = Arc::new(
            ScriptedExecutor::default().reply(Err(ApiError::Network("connection refused".to_string()))),
        );
        let transport = transport(Arc::new(MemoryStore::new()), executor);
        let err = transport.send(ApiCall::published_posts()).await.unwrap_err();
        assert!(matches!(&err, ApiError::Network(msg) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn one_attempt_per_call() {
        let executor = Arc::new(ScriptedExecutor::default().json(500, r#"{"detail":"down"}"#));
        let transport = transport(Arc::new(MemoryStore::new()), executor.clone());
        let err = transport.send(ApiCall::published_posts()).await.unwrap_err();
        assert_eq!(err.to_string(), "down");
        assert_eq!(executor.requests().len(), 1);
    }
}
