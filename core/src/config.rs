//! Client configuration.
//!
//! The core only consumes a resolved base URL; where it comes from (build
//! config, environment, host app settings) is up to the embedding app.

use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

pub const BASE_URL_ENV: &str = "SIDEHUSTLE_API_URL";
pub const AUTH_SCHEME_ENV: &str = "SIDEHUSTLE_AUTH_SCHEME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Prefix of the `Authorization` header value.
    pub auth_scheme: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
        }
    }

    pub fn with_auth_scheme(mut self, scheme: &str) -> Self {
        self.auth_scheme = scheme.to_string();
        self
    }

    /// Read `SIDEHUSTLE_API_URL` / `SIDEHUSTLE_AUTH_SCHEME`, falling back to
    /// the local development server.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            base_url: non_empty(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth_scheme: non_empty(AUTH_SCHEME_ENV)
                .unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
