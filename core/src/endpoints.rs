//! Paths and request options for every endpoint the app consumes.

use serde::Serialize;

use crate::client::RequestOptions;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{Credentials, PostDraft, Registration};

/// A path plus request options, ready for `ApiClient::build` or
/// `Transport::send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub path: String,
    pub options: RequestOptions,
}

impl ApiCall {
    fn get(path: String) -> Self {
        Self {
            path,
            options: RequestOptions::get(),
        }
    }

    fn without_body(method: HttpMethod, path: String) -> Self {
        Self {
            path,
            options: RequestOptions::new(method),
        }
    }

    fn with_json<T: Serialize>(method: HttpMethod, path: String, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            path,
            options: RequestOptions::new(method).with_body(body),
        })
    }

    pub fn login(credentials: &Credentials) -> Result<Self, ApiError> {
        Self::with_json(HttpMethod::Post, "/auth/login/".to_string(), credentials)
    }

    pub fn register(registration: &Registration) -> Result<Self, ApiError> {
        Self::with_json(HttpMethod::Post, "/auth/register/".to_string(), registration)
    }

    pub fn current_user() -> Self {
        Self::get("/auth/user/".to_string())
    }

    pub fn published_posts() -> Self {
        Self::get("/posts/published/".to_string())
    }

    pub fn my_posts() -> Self {
        Self::get("/posts/my_posts/".to_string())
    }

    pub fn get_post(id: i64) -> Self {
        Self::get(format!("/posts/{id}/"))
    }

    pub fn create_post(draft: &PostDraft) -> Result<Self, ApiError> {
        Self::with_json(HttpMethod::Post, "/posts/".to_string(), draft)
    }

    pub fn update_post(id: i64, draft: &PostDraft) -> Result<Self, ApiError> {
        Self::with_json(HttpMethod::Put, format!("/posts/{id}/"), draft)
    }

    pub fn delete_post(id: i64) -> Self {
        Self::without_body(HttpMethod::Delete, format!("/posts/{id}/"))
    }

    pub fn publish_post(id: i64) -> Self {
        Self::without_body(HttpMethod::Post, format!("/posts/{id}/publish/"))
    }
}
