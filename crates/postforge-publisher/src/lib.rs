//! # Postforge Publisher
//! Pushes finished posts to the blogging platform.
//!
//! `BloggerPublisher` talks to the Blogger v3 API; `DryRunPublisher` stands
//! in when Blogger is not configured, logging the post and returning a
//! synthetic URL so the rest of the pipeline can be exercised end to end.

pub mod blogger;
pub mod html;

pub use blogger::BloggerPublisher;

use async_trait::async_trait;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::traits::Publisher;
use postforge_core::types::{PostRecord, PublishedPost, SeoSettings};
use postforge_core::PostforgeConfig;

/// Create the publisher the configuration calls for.
pub fn create_publisher(config: &PostforgeConfig) -> Result<Box<dyn Publisher>> {
    match (config.blogger_blog_id(), config.blogger_access_token()) {
        (Some(blog_id), Some(token)) => {
            Ok(Box::new(BloggerPublisher::new(config, blog_id, token)))
        }
        _ => {
            tracing::warn!("Blogger not configured — posts will be published as dry runs");
            Ok(Box::new(DryRunPublisher))
        }
    }
}

/// Logs the would-be post and fabricates a URL. Used when no platform
/// credentials are configured.
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn publish(&self, record: &PostRecord, _seo: &SeoSettings) -> Result<PublishedPost> {
        let content = record.content.as_ref().ok_or_else(|| {
            PostforgeError::publish(format!("post {} has no generated content", record.id))
        })?;
        tracing::info!(
            "[dry-run] Would publish '{}' ({} words)",
            record.title,
            content.word_count
        );
        Ok(PublishedPost {
            url: format!("dry-run://postforge/{}", record.id),
        })
    }
}
