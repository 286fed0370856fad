//! # Postforge Content
//! Content generation backends and SEO analysis.
//!
//! The OpenAI-backed generator produces the article; the HuggingFace image
//! client optionally attaches a featured image; the template generator is an
//! offline fallback so the pipeline keeps working without API keys.

pub mod image;
pub mod keywords;
pub mod openai;
pub mod seo;
pub mod template;

pub use image::HfImageClient;
pub use openai::OpenAiGenerator;
pub use template::TemplateGenerator;

use postforge_core::traits::ContentGenerator;
use postforge_core::{PostforgeConfig, Result};

/// Create the content generator the configuration calls for.
pub fn create_generator(config: &PostforgeConfig) -> Result<Box<dyn ContentGenerator>> {
    let image = HfImageClient::from_config(config);
    match config.openai_api_key() {
        Some(key) => Ok(Box::new(OpenAiGenerator::new(config, key, image))),
        None => {
            tracing::warn!("No OpenAI API key configured — using offline template generator");
            Ok(Box::new(TemplateGenerator::new(image)))
        }
    }
}
