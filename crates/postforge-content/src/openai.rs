//! OpenAI-backed article generator.

use async_trait::async_trait;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::traits::ContentGenerator;
use postforge_core::types::{ContentSettings, GeneratedContent};
use postforge_core::PostforgeConfig;

use crate::image::HfImageClient;
use crate::keywords;

pub struct OpenAiGenerator {
    api_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    image: Option<HfImageClient>,
}

impl OpenAiGenerator {
    pub fn new(config: &PostforgeConfig, api_key: String, image: Option<HfImageClient>) -> Self {
        Self {
            api_url: config.openai_api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.openai_model.clone(),
            client: reqwest::Client::new(),
            image,
        }
    }

    fn build_prompt(title: &str, keywords: &[String], settings: &ContentSettings) -> String {
        format!(
            "Write a blog article about '{title}' to this specification:\n\
             \n\
             1. Between {min} and {max} words\n\
             2. SEO-optimized for these keywords: {keywords}\n\
             3. Easy-to-scan structure with H2 and H3 headings (markdown ## / ###)\n\
             4. Short paragraphs, two to three sentences each\n\
             5. Include bullet points or numbered lists where helpful\n\
             6. Work long-tail keywords in naturally\n\
             7. End with a call to action\n\
             8. Evergreen content, informative but engaging tone\n\
             9. Audience: beginner to intermediate readers\n\
             \n\
             Respond in exactly this labelled format:\n\
             Title: [article title]\n\
             Meta Description: [150-160 character description]\n\
             Content: [full article body in markdown]\n",
            min = settings.min_words,
            max = settings.max_words,
            keywords = keywords.join(", "),
        )
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        title: &str,
        keywords: &[String],
        settings: &ContentSettings,
    ) -> Result<GeneratedContent> {
        let keywords: Vec<String> = if keywords.is_empty() && settings.auto_research_keywords {
            keywords::research_keywords(title)
        } else {
            keywords.to_vec()
        };

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an SEO content specialist writing for a cryptocurrency blog."
                },
                { "role": "user", "content": Self::build_prompt(title, &keywords, settings) }
            ],
            "max_tokens": 4000,
            "temperature": 0.7,
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PostforgeError::http(format!("OpenAI connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PostforgeError::generation(format!(
                "OpenAI API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| PostforgeError::http(e.to_string()))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                PostforgeError::generation("OpenAI response had no message content".to_string())
            })?;

        let mut content = parse_generated(reply, title, keywords);

        if settings.auto_generate_images {
            if let Some(image) = &self.image {
                let prompt = crate::image::image_prompt(title);
                match image.create_image(&prompt).await {
                    Ok(path) => content.image_ref = Some(path),
                    Err(e) => tracing::warn!("Image generation failed for '{title}': {e}"),
                }
            }
        }

        Ok(content)
    }
}

/// Parse the model's labelled reply into structured content. A reply that
/// ignores the format falls back to being treated as the whole body.
pub(crate) fn parse_generated(
    reply: &str,
    fallback_title: &str,
    keywords: Vec<String>,
) -> GeneratedContent {
    let mut meta_description = String::new();
    let mut body = String::new();
    let mut in_content = false;

    for section in reply.split("\n\n") {
        let trimmed = section.trim();
        if trimmed.strip_prefix("Title:").is_some() {
            // The record's title is authoritative; the model's restatement is dropped.
            in_content = false;
        } else if let Some(rest) = trimmed.strip_prefix("Meta Description:") {
            meta_description = rest.trim().to_string();
            in_content = false;
        } else if let Some(rest) = trimmed.strip_prefix("Content:") {
            body = rest.trim().to_string();
            in_content = true;
        } else if in_content {
            body.push_str("\n\n");
            body.push_str(trimmed);
        }
    }

    if body.is_empty() {
        body = reply.trim().to_string();
    }
    if meta_description.is_empty() {
        meta_description = format!("A complete guide to {fallback_title}.");
    }

    let word_count = body.split_whitespace().count();
    GeneratedContent {
        body,
        meta_description,
        keywords,
        word_count,
        image_ref: None,
        seo: None,
    }
}
