use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Story,
    Terror,
}

/// Reusable system/user prompt pair. Owned by the external prompt-management
/// collaborator; the core only reads the active one per content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: u32,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub system_message: String,
    /// May contain the literal `{nextChapter}` placeholder.
    pub user_prompt: String,
    pub is_active: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable record of a post the platform accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPost {
    pub id: u32,
    pub external_post_id: String,
    pub content: String,
    pub media_id: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub chapter: Option<u32>,
    #[serde(default)]
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub external_post_id: String,
    pub content: String,
    pub media_id: String,
    pub chapter: Option<u32>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub title: String,
    pub narration: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub chapter: u32,
    pub caption: String,
    pub content: String,
    pub external_post_id: String,
    pub media_id: String,
}
