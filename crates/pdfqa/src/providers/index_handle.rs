//! One-time initialized handle to the vector index

use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

use super::vector_store::VectorIndex;

/// Shared vector index connection, created at most once
///
/// Concurrent first callers of [`IndexHandle::init`] wait for the single
/// in-flight connection attempt. A failed attempt leaves the handle empty so
/// it can be retried.
#[derive(Clone, Default)]
pub struct IndexHandle {
    cell: Arc<OnceCell<Arc<dyn VectorIndex>>>,
}

impl IndexHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is already initialized
    pub fn ready(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            cell: Arc::new(OnceCell::new_with(Some(index))),
        }
    }

    /// Initialize the index with `connect` unless another caller already has
    pub async fn init<F, Fut>(&self, connect: F) -> Result<Arc<dyn VectorIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn VectorIndex>>>,
    {
        let index = self.cell.get_or_try_init(connect).await?;
        Ok(Arc::clone(index))
    }

    /// The index, or [`Error::NotReady`] before initialization
    pub fn get(&self) -> Result<Arc<dyn VectorIndex>> {
        self.cell.get().map(Arc::clone).ok_or(Error::NotReady)
    }

    /// Whether initialization has completed
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}
