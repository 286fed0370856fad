//! Featured-image generation via the HuggingFace inference API.
//!
//! Image failures are never fatal to an article — callers log and publish
//! without one.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use postforge_core::error::{PostforgeError, Result};
use postforge_core::PostforgeConfig;

pub struct HfImageClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
    out_dir: PathBuf,
}

impl HfImageClient {
    /// Build from configuration; `None` when no HuggingFace key is set.
    pub fn from_config(config: &PostforgeConfig) -> Option<Self> {
        let api_key = config.hf_api_key()?;
        Some(Self {
            api_url: config.hf_image_model_url.clone(),
            api_key,
            client: reqwest::Client::new(),
            out_dir: config.images_dir(),
        })
    }

    #[cfg(test)]
    fn for_test(api_url: String, out_dir: PathBuf) -> Self {
        Self {
            api_url,
            api_key: "hf-test".into(),
            client: reqwest::Client::new(),
            out_dir,
        }
    }

    /// Run the model and store the resulting JPEG under the images directory.
    /// Returns the stored file path.
    pub async fn create_image(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|e| PostforgeError::http(format!("HuggingFace connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PostforgeError::generation(format!(
                "Image generation failed {status}: {text}"
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| PostforgeError::http(e.to_string()))?;

        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("generated_{:010x}.jpg", short_hash(prompt)));
        std::fs::write(&path, &bytes)?;

        let path = path.to_string_lossy().to_string();
        tracing::info!("Image generated: {path}");
        Ok(path)
    }
}

/// Deterministic prompt for a featured image (no LLM round-trip needed).
pub fn image_prompt(title: &str) -> String {
    format!(
        "Professional digital art illustration about {title}, cryptocurrency blockchain \
         technology, futuristic style, blue orange color scheme, landscape 16:9, high quality"
    )
}

fn short_hash(input: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish() & 0xff_ffff_ffff
}
