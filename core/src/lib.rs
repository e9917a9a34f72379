//! Client-side data access and session core for the sideHUSTLE app.
//!
//! # Overview
//! Two layers, built bottom-up:
//! - the request pipeline: `ApiClient` builds requests and normalizes
//!   responses without I/O, `Transport` adds the stored token, one
//!   `HttpExecutor` round-trip and typed auth/posts calls;
//! - the session: `SessionManager` restores, logs in, registers and logs out,
//!   writing the token and user through to a `KeyValueStore`.
//!
//! # Design
//! - The pure half (`client`, `endpoints`, `http`) is what the FFI crate
//!   exposes, so a native host can own the HTTP round-trip.
//! - `AppContext` is constructed once by the app root and injected into
//!   collaborators; there is no global session.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod logging;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{ApiClient, Payload, RequestOptions};
pub use config::ClientConfig;
pub use context::AppContext;
pub use endpoints::ApiCall;
pub use error::{ApiError, StorageError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Session, SessionManager, SessionStatus};
pub use storage::{FileStore, KeyValueStore, MemoryStore, AUTH_TOKEN_KEY, USER_KEY};
pub use transport::{HttpExecutor, ReqwestExecutor, Transport};
pub use types::{
    AuthResponse, Category, Credentials, Post, PostDraft, PostStatus, Registration, UserProfile,
};
