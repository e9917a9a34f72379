//! Domain DTOs for the sideHUSTLE API.
//!
//! # Design
//! These types mirror the server's JSON schema, including its field casing:
//! users use snake_case plus `ANumber`, posts use PascalCase. They are
//! defined independently from the mock-server crate; integration tests catch
//! any schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of an account, as returned by the auth endpoints and embedded in
/// every post. Persisted as JSON alongside the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "ANumber")]
    pub a_number: String,
}

/// Body of a successful login or register call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Account creation payload. `password_confirm` is checked client-side and
/// never sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub password_confirm: String,
    #[serde(rename = "ANumber")]
    pub a_number: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tech,
    Healthcare,
    Finance,
    Education,
    Retail,
    Food,
    Sustainability,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// An idea listing returned by the posts endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Post {
    #[serde(rename = "PostID")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub target_market: Option<String>,
    pub business_model: Option<String>,
    /// Decimal amount as the server formats it, e.g. `"2500.00"`.
    pub funding_needs: Option<String>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: UserProfile,
}

/// Writable post fields, sent on create and on full update. Missing fields
/// deserialize to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_needs: Option<String>,
    pub status: PostStatus,
}
