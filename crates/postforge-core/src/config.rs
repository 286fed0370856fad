//! Process configuration — API credentials, data paths, loop timing.
//!
//! Lives as TOML at `~/.postforge/config.toml`. Distinct from the
//! dashboard-editable [`ScheduleSettings`](crate::types::ScheduleSettings),
//! which the schedule store owns.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PostforgeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostforgeConfig {
    /// OpenAI API key; empty means fall back to `OPENAI_API_KEY` or the
    /// offline template generator.
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    /// HuggingFace inference key for image generation; empty disables images.
    pub hf_api_key: String,
    pub hf_image_model_url: String,
    pub blogger_blog_id: String,
    pub blogger_access_token: String,
    pub blogger_api_url: String,
    /// Where posts.json, titles.json, schedule.json, and images/ live.
    pub data_dir: PathBuf,
    pub tick_interval_secs: u64,
    pub generation_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for PostforgeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".into(),
            openai_api_url: "https://api.openai.com".into(),
            hf_api_key: String::new(),
            hf_image_model_url:
                "https://api-inference.huggingface.co/models/runwayml/stable-diffusion-v1-5".into(),
            blogger_blog_id: String::new(),
            blogger_access_token: String::new(),
            blogger_api_url: "https://www.googleapis.com/blogger/v3".into(),
            data_dir: Self::home_dir().join("data"),
            tick_interval_secs: 60,
            generation_timeout_secs: 120,
            publish_timeout_secs: 30,
        }
    }
}

impl PostforgeConfig {
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".postforge")
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PostforgeError::invalid_config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PostforgeError::invalid_config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn openai_api_key(&self) -> Option<String> {
        field_or_env(&self.openai_api_key, "OPENAI_API_KEY")
    }

    pub fn hf_api_key(&self) -> Option<String> {
        field_or_env(&self.hf_api_key, "HF_API_KEY")
    }

    pub fn blogger_blog_id(&self) -> Option<String> {
        field_or_env(&self.blogger_blog_id, "BLOGGER_BLOG_ID")
    }

    pub fn blogger_access_token(&self) -> Option<String> {
        field_or_env(&self.blogger_access_token, "BLOGGER_ACCESS_TOKEN")
    }

    pub fn posts_path(&self) -> PathBuf {
        self.data_dir.join("posts.json")
    }

    pub fn titles_path(&self) -> PathBuf {
        self.data_dir.join("titles.json")
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.data_dir.join("schedule.json")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}

fn field_or_env(field: &str, var: &str) -> Option<String> {
    if !field.trim().is_empty() {
        return Some(field.trim().to_string());
    }
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
