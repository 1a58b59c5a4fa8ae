//! Document loader trait

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::Page;

/// Turns a file on disk into ordered pages of text
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load pages in document order
    async fn load(&self, location: &Path) -> Result<Vec<Page>>;

    /// Get loader name for logging
    fn name(&self) -> &str;
}
