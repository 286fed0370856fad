//! Blogger API v3 publisher.

use async_trait::async_trait;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::traits::Publisher;
use postforge_core::types::{PostRecord, PublishedPost, SeoSettings};
use postforge_core::PostforgeConfig;

use crate::html;

pub struct BloggerPublisher {
    api_url: String,
    blog_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl BloggerPublisher {
    pub fn new(config: &PostforgeConfig, blog_id: String, access_token: String) -> Self {
        Self {
            api_url: config.blogger_api_url.trim_end_matches('/').to_string(),
            blog_id,
            access_token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Publisher for BloggerPublisher {
    fn name(&self) -> &str {
        "blogger"
    }

    async fn publish(&self, record: &PostRecord, seo: &SeoSettings) -> Result<PublishedPost> {
        let content = record.content.as_ref().ok_or_else(|| {
            PostforgeError::publish(format!("post {} has no generated content", record.id))
        })?;

        let excerpt = seo
            .meta_description_auto
            .then_some(content.meta_description.as_str());
        let html_body = html::format_content(&content.body, content.image_ref.as_deref(), excerpt);

        let body = serde_json::json!({
            "title": record.title,
            "content": html_body,
            "labels": content.keywords,
        });

        let resp = self
            .client
            .post(format!("{}/blogs/{}/posts/", self.api_url, self.blog_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostforgeError::http(format!("Blogger connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PostforgeError::publish(format!(
                "Blogger API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| PostforgeError::http(e.to_string()))?;
        let url = json["url"].as_str().unwrap_or_default().to_string();

        tracing::info!("Published '{}' to {url}", record.title);
        Ok(PublishedPost { url })
    }
}
