//! Offline template generator — keeps the pipeline working without API keys.

use async_trait::async_trait;

use postforge_core::error::Result;
use postforge_core::traits::ContentGenerator;
use postforge_core::types::{ContentSettings, GeneratedContent};

use crate::image::HfImageClient;
use crate::keywords;

pub struct TemplateGenerator {
    image: Option<HfImageClient>,
}

impl TemplateGenerator {
    pub fn new(image: Option<HfImageClient>) -> Self {
        Self { image }
    }

    fn render(title: &str, keywords: &[String]) -> String {
        let bullet_list = if keywords.is_empty() {
            "- Understanding the fundamentals\n- Practical implementation\n- Tips and best practices".to_string()
        } else {
            keywords
                .iter()
                .take(6)
                .map(|kw| format!("- {kw}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "# {title}\n\n\
             ## Introduction\n\
             This article covers {title} in detail. In this guide you will learn the core \
             concepts, practical implementation steps, and useful tips.\n\n\
             ## Key Points\n\
             {bullet_list}\n\n\
             ## Implementation\n\
             The following steps walk through a practical implementation you can follow \
             at your own pace. Start small, verify each step, and build up from there.\n\n\
             ## Common Mistakes to Avoid\n\
             Most newcomers move too fast. Double-check sources, keep records, and never \
             commit more than you can afford to lose.\n\n\
             ## Conclusion\n\
             {title} is an important topic to understand. With this guide you have the \
             foundations needed to take the next step.\n\n\
             **Start your journey today!**"
        )
    }
}

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        "template"
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

        let body = Self::render(title, &keywords);
        let word_count = body.split_whitespace().count();

        let mut content = GeneratedContent {
            body,
            meta_description: format!(
                "A complete guide to {title}. Learn the concepts, implementation, and best practices."
            ),
            keywords,
            word_count,
            image_ref: None,
            seo: None,
        };

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
