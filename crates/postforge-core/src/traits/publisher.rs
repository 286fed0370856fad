//! Publishing boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PostRecord, PublishedPost, SeoSettings};

/// Pushes a generated post to the blogging platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    /// The record's `content` must be populated; implementations return
    /// a `Publish` error otherwise.
    async fn publish(&self, record: &PostRecord, seo: &SeoSettings) -> Result<PublishedPost>;
}
