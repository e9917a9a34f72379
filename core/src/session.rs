//! Authenticated-session state machine.
//!
//! # Overview
//! `SessionManager` owns the one `Session` of an application context and
//! drives it through `Idle -> Loading -> {Authenticated, Idle}` with four
//! operations: `restore`, `login`, `register` and `logout`. Collaborators
//! read snapshots or subscribe to changes through a `watch` channel.
//!
//! # Design
//! - Write-through: storage writes happen only after the network call that
//!   produced their payload succeeded, and the in-memory state is updated
//!   once the writes are done.
//! - Entering `Loading` clears `user` and `token`, so only `Authenticated`
//!   ever carries both.
//! - Mutating operations are single-flight: a `tokio::sync::Mutex` admits one
//!   at a time and later calls queue behind it, so the state always reflects
//!   the operations in the order they were issued.
//! - A restored token is trusted until an API call proves it invalid.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::storage::{KeyValueStore, AUTH_TOKEN_KEY, USER_KEY};
use crate::transport::Transport;
use crate::types::{AuthResponse, Credentials, Registration, UserProfile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Authenticated,
}

/// Snapshot of the session. A failed login or register leaves
/// `status == Idle` with `error` set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub status: SessionStatus,
    pub error: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }
}

pub struct SessionManager {
    transport: Transport,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
    in_flight: Mutex<()>,
}

impl SessionManager {
    /// Starts `Idle` with no user or token. Persists through the transport's
    /// store so requests and the session see the same token.
    pub fn new(transport: Transport) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            store: transport.store(),
            transport,
            state,
            in_flight: Mutex::new(()),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Rebuild the session from durable storage without a network call.
    ///
    /// A missing token, a missing user or an unparseable user all mean
    /// "logged out"; none of them is reported as an error.
    pub async fn restore(&self) -> Session {
        let _flight = self.in_flight.lock().await;
        self.enter_loading();

        match self.read_persisted().await {
            Some((token, user)) => {
                info!(user_id = user.id, "session restored");
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.token = Some(token);
                    s.status = SessionStatus::Authenticated;
                    s.error = None;
                });
            }
            None => {
                info!("no stored session");
                self.state.send_modify(|s| {
                    s.user = None;
                    s.token = None;
                    s.status = SessionStatus::Idle;
                    s.error = None;
                });
            }
        }
        self.snapshot()
    }

    /// Exchange credentials for a session. Failures end `Idle` with the
    /// error message; they are never returned as `Err`.
    ///
    /// A failure leaves durable storage as it was. After a failed re-login
    /// the in-memory session is logged out while the stored token and user
    /// remain: API calls keep sending that token and `restore` brings the
    /// old user back. Call `logout` to drop them.
    pub async fn login(&self, credentials: &Credentials) -> Session {
        let _flight = self.in_flight.lock().await;
        self.enter_loading();
        let outcome = self.transport.login(credentials).await;
        self.finish_authentication("login", outcome).await
    }

    /// Create an account; success authenticates immediately.
    pub async fn register(&self, registration: &Registration) -> Session {
        let _flight = self.in_flight.lock().await;
        self.enter_loading();
        let outcome = self.transport.register(registration).await;
        self.finish_authentication("register", outcome).await
    }

    /// Forget the session locally. Never contacts the server and never
    /// fails; storage removal errors are logged and ignored.
    pub async fn logout(&self) -> Session {
        let _flight = self.in_flight.lock().await;
        self.enter_loading();

        for key in [AUTH_TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.store.remove_item(key).await {
                warn!(key, error = %err, "failed to clear stored session key");
            }
        }

        self.state.send_modify(|s| {
            s.user = None;
            s.token = None;
            s.status = SessionStatus::Idle;
        });
        info!("logged out");
        self.snapshot()
    }

    /// Drop the last error message. Login and register leave a previous
    /// error in place until they finish, so forms call this first.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    fn enter_loading(&self) {
        self.state.send_modify(|s| {
            s.user = None;
            s.token = None;
            s.status = SessionStatus::Loading;
        });
    }

    async fn finish_authentication(
        &self,
        operation: &'static str,
        outcome: Result<AuthResponse, ApiError>,
    ) -> Session {
        let outcome = match outcome {
            Ok(auth) => self.persist(&auth).await.map(|()| auth),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(auth) => {
                info!(operation, user_id = auth.user.id, "authenticated");
                self.state.send_modify(|s| {
                    s.user = Some(auth.user);
                    s.token = Some(auth.token);
                    s.status = SessionStatus::Authenticated;
                    s.error = None;
                });
            }
            Err(err) => {
                warn!(operation, error = %err, "authentication failed");
                let message = err.to_string();
                self.state.send_modify(|s| {
                    s.user = None;
                    s.token = None;
                    s.status = SessionStatus::Idle;
                    s.error = Some(message);
                });
            }
        }
        self.snapshot()
    }

    /// Token first, then user: two independent writes.
    async fn persist(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        let user = serde_json::to_string(&auth.user)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.store.set_item(AUTH_TOKEN_KEY, &auth.token).await?;
        self.store.set_item(USER_KEY, &user).await?;
        Ok(())
    }

    async fn read_persisted(&self) -> Option<(String, UserProfile)> {
        let token = self.read_key(AUTH_TOKEN_KEY).await?;
        let raw_user = self.read_key(USER_KEY).await?;
        match serde_json::from_str(&raw_user) {
            Ok(user) => Some((token, user)),
            Err(err) => {
                warn!(error = %err, "stored user record is unreadable");
                None
            }
        }
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get_item(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(key, error = %err, "failed to read stored session key");
                None
            }
        }
    }
}
