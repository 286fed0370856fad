//! Content generation boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContentSettings, GeneratedContent};

/// Produces an article body (and optionally an image reference) for a title.
///
/// Implementations may block for seconds; the scheduler wraps calls in a
/// timeout, so they do not need their own deadline handling.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        title: &str,
        keywords: &[String],
        settings: &ContentSettings,
    ) -> Result<GeneratedContent>;
}
