//! Typed auth and posts calls. Each one is a thin caller of
//! `Transport::send` followed by a shape check.

use tracing::info;

use crate::endpoints::ApiCall;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{AuthResponse, Credentials, Post, PostDraft, Registration, UserProfile};

impl Transport {
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.send(ApiCall::login(credentials)?).await?.decode()
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.send(ApiCall::register(registration)?).await?.decode()
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.send(ApiCall::current_user()).await?.decode()
    }

    pub async fn published_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.send(ApiCall::published_posts()).await?.decode()
    }

    pub async fn my_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.send(ApiCall::my_posts()).await?.decode()
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, ApiError> {
        self.send(ApiCall::get_post(id)).await?.decode()
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, ApiError> {
        self.send(ApiCall::create_post(draft)?).await?.decode()
    }

    pub async fn update_post(&self, id: i64, draft: &PostDraft) -> Result<Post, ApiError> {
        self.send(ApiCall::update_post(id, draft)?).await?.decode()
    }

    /// The payload of a delete is ignored; any successful response counts.
    pub async fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        self.send(ApiCall::delete_post(id)).await?;
        Ok(())
    }

    pub async fn publish_post(&self, id: i64) -> Result<Post, ApiError> {
        let post: Post = self.send(ApiCall::publish_post(id)).await?.decode()?;
        info!(post_id = post.id, "post published");
        Ok(post)
    }
}
