use crate::error::StoreError;
use crate::models::{ContentType, NewPost, PromptTemplate, PublishedPost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[async_trait]
pub trait PromptStore: Send + Sync {
    async fn get_active(
        &self,
        content_type: ContentType,
    ) -> Result<Option<PromptTemplate>, StoreError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn save(&self, post: NewPost) -> Result<PublishedPost, StoreError>;
    async fn find_most_recent(&self) -> Result<Option<PublishedPost>, StoreError>;
}

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn find_latest(&self) -> Result<Option<u32>, StoreError>;
    async fn save(&self, counter: u32) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ChapterCounter {
    current_chapter: u32,
    updated_at: DateTime<Utc>,
}

/// Flat-file repositories under one data directory. Each collection is a
/// single JSON document, read and rewritten whole per operation.
pub struct JsonStore {
    prompts_path: PathBuf,
    posts_path: PathBuf,
    chapter_path: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            prompts_path: data_dir.join("prompts.json"),
            posts_path: data_dir.join("posts.json"),
            chapter_path: data_dir.join("chapter.json"),
        }
    }

    async fn load<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    async fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(value)?;
        fs::write(path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl PromptStore for JsonStore {
    async fn get_active(
        &self,
        content_type: ContentType,
    ) -> Result<Option<PromptTemplate>, StoreError> {
        let templates: Vec<PromptTemplate> =
            Self::load(&self.prompts_path).await?.unwrap_or_default();
        Ok(templates
            .into_iter()
            .filter(|t| t.is_active && t.content_type == content_type)
            .max_by_key(|t| t.updated_at))
    }
}

#[async_trait]
impl PostRepository for JsonStore {
    async fn save(&self, post: NewPost) -> Result<PublishedPost, StoreError> {
        let mut posts: Vec<PublishedPost> =
            Self::load(&self.posts_path).await?.unwrap_or_default();
        let id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let record = PublishedPost {
            id,
            external_post_id: post.external_post_id,
            content: post.content,
            media_id: post.media_id,
            media_url: None,
            chapter: post.chapter,
            caption: post.caption,
            created_at: Utc::now(),
        };
        posts.push(record.clone());
        Self::write(&self.posts_path, &posts).await?;
        Ok(record)
    }

    async fn find_most_recent(&self) -> Result<Option<PublishedPost>, StoreError> {
        let posts: Vec<PublishedPost> = Self::load(&self.posts_path).await?.unwrap_or_default();
        Ok(posts.into_iter().max_by_key(|p| p.created_at))
    }
}

#[async_trait]
impl ChapterRepository for JsonStore {
    async fn find_latest(&self) -> Result<Option<u32>, StoreError> {
        let counter: Option<ChapterCounter> = Self::load(&self.chapter_path).await?;
        Ok(counter.map(|c| c.current_chapter))
    }

    async fn save(&self, counter: u32) -> Result<(), StoreError> {
        let record = ChapterCounter {
            current_chapter: counter,
            updated_at: Utc::now(),
        };
        Self::write(&self.chapter_path, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::default_template;
    use chrono::Duration;

    fn new_post(external_post_id: &str, chapter: u32) -> NewPost {
        NewPost {
            external_post_id: external_post_id.to_string(),
            content: "narration".to_string(),
            media_id: format!("media-{chapter}"),
            chapter: Some(chapter),
            caption: Some(format!("Chapter {chapter}: Test")),
        }
    }

    #[tokio::test]
    async fn chapter_counter_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert_eq!(ChapterRepository::find_latest(&store).await.unwrap(), None);

        ChapterRepository::save(&store, 7).await.unwrap();
        assert_eq!(
            ChapterRepository::find_latest(&store).await.unwrap(),
            Some(7)
        );
    }

    #[tokio::test]
    async fn posts_get_sequential_ids_and_most_recent_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.find_most_recent().await.unwrap().is_none());

        let first = PostRepository::save(&store, new_post("100", 1)).await.unwrap();
        let second = PostRepository::save(&store, new_post("101", 2)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let recent = store.find_most_recent().await.unwrap().unwrap();
        assert_eq!(recent.external_post_id, "101");
        assert_eq!(recent.chapter, Some(2));
    }

    #[tokio::test]
    async fn get_active_filters_type_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let mut story = default_template(ContentType::Story);
        story.id = 1;
        let mut inactive_story = default_template(ContentType::Story);
        inactive_story.id = 2;
        inactive_story.is_active = false;
        let mut terror = default_template(ContentType::Terror);
        terror.id = 3;
        terror.updated_at = terror.updated_at + Duration::seconds(5);

        JsonStore::write(
            &store.prompts_path,
            &vec![story, inactive_story, terror],
        )
        .await
        .unwrap();

        let active = store.get_active(ContentType::Story).await.unwrap().unwrap();
        assert_eq!(active.id, 1);
        let active = store.get_active(ContentType::Terror).await.unwrap().unwrap();
        assert_eq!(active.id, 3);
    }

    #[tokio::test]
    async fn missing_prompt_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.get_active(ContentType::Story).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_store_surfaces_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        fs::write(&store.chapter_path, "not json").await.unwrap();
        assert!(matches!(
            ChapterRepository::find_latest(&store).await,
            Err(StoreError::Serde(_))
        ));
    }
}
