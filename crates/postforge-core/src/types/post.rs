//! Post records and their lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a post record.
///
/// Legal transitions: `Pending → Generating → {ReadyToPublish | Failed}`,
/// `ReadyToPublish → {Published | Failed}`. `Published` is terminal;
/// `Failed` is terminal except for an operator retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostState {
    Pending,
    Generating,
    ReadyToPublish,
    Published,
    Failed,
}

impl PostState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostState::Published | PostState::Failed)
    }

    /// Whether a record may move from `self` to `to`.
    pub fn can_transition_to(&self, to: PostState) -> bool {
        matches!(
            (self, to),
            (PostState::Pending, PostState::Generating)
                | (PostState::Generating, PostState::ReadyToPublish)
                | (PostState::Generating, PostState::Failed)
                | (PostState::ReadyToPublish, PostState::Published)
                | (PostState::ReadyToPublish, PostState::Failed)
        )
    }
}

impl std::fmt::Display for PostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostState::Pending => write!(f, "pending"),
            PostState::Generating => write!(f, "generating"),
            PostState::ReadyToPublish => write!(f, "ready_to_publish"),
            PostState::Published => write!(f, "published"),
            PostState::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PostState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PostState::Pending),
            "generating" => Ok(PostState::Generating),
            "ready_to_publish" | "ready" => Ok(PostState::ReadyToPublish),
            "published" => Ok(PostState::Published),
            "failed" => Ok(PostState::Failed),
            other => Err(format!("unknown post state: {other}")),
        }
    }
}

/// One post in the pipeline, from queued title to published article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub state: PostState,
    /// None means "publish as soon as possible".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Set exactly when the record enters `Published`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    /// Present only when `state == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Populated on entering `ReadyToPublish`; retained through a publish
    /// failure so a retry does not regenerate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<GeneratedContent>,
}

impl PostRecord {
    pub fn new(
        title: impl Into<String>,
        keywords: Vec<String>,
        scheduled_for: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            keywords,
            state: PostState::Pending,
            scheduled_for,
            created_at: now,
            published_at: None,
            published_url: None,
            failure_reason: None,
            content: None,
        }
    }

    /// Eligible for selection: pending, and its scheduled slot has arrived.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == PostState::Pending && self.scheduled_for.is_none_or(|at| at <= now)
    }
}

/// Article body and companion assets produced by a content generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedContent {
    /// Markdown article body.
    pub body: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoReport>,
}

/// Result of a successful publish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPost {
    pub url: String,
}

/// A bulk-uploaded title awaiting conversion into a post record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedTitle {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub added_at: DateTime<Utc>,
}

/// SEO analysis attached to generated content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeoReport {
    /// Composite score, 0–100.
    pub score: u32,
    pub word_count: usize,
    pub headings: HeadingCounts,
    pub readability: Readability,
    pub keyword_stats: BTreeMap<String, KeywordStats>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Readability {
    pub avg_sentence_length: f64,
    pub avg_word_length: f64,
    /// "easy", "medium", or "hard".
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordStats {
    pub count: usize,
    /// Occurrences per hundred words.
    pub density: f64,
}
