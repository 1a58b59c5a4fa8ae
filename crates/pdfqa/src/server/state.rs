//! Application state for the HTTP server

use std::sync::Arc;

use crate::service::ChatService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<ChatService>,
}

impl AppState {
    /// Wrap a service
    pub fn new(service: ChatService) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    /// From an already shared service
    pub fn from_shared(service: Arc<ChatService>) -> Self {
        Self { inner: service }
    }

    /// The chat service
    pub fn service(&self) -> &ChatService {
        &self.inner
    }

    /// Whether the vector index is connected
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}
