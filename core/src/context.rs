//! Application-wide context object.
//!
//! Built once at startup by the app root and handed to every collaborator;
//! it lives for the rest of the process.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::session::SessionManager;
use crate::storage::KeyValueStore;
use crate::transport::{HttpExecutor, ReqwestExecutor, Transport};

#[derive(Clone)]
pub struct AppContext {
    config: ClientConfig,
    transport: Transport,
    session: Arc<SessionManager>,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        executor: Arc<dyn HttpExecutor>,
    ) -> Self {
        let transport = Transport::new(&config, store, executor);
        let session = Arc::new(SessionManager::new(transport.clone()));
        Self {
            config,
            transport,
            session,
        }
    }

    /// Configuration from the environment plus the reqwest executor.
    pub fn from_env(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(ClientConfig::from_env(), store, Arc::new(ReqwestExecutor::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Posts and profile calls.
    pub fn api(&self) -> &Transport {
        &self.transport
    }

    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }
}
