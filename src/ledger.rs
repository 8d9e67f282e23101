use crate::error::LedgerError;
use crate::models::PublishedPost;
use crate::store::{ChapterRepository, PostRepository};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Durable "current chapter" counter, cross-checked against the chapter
/// numbers that actually made it onto the platform.
pub struct ChapterLedger {
    chapters: Arc<dyn ChapterRepository>,
    posts: Arc<dyn PostRepository>,
}

impl ChapterLedger {
    pub fn new(chapters: Arc<dyn ChapterRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { chapters, posts }
    }

    /// Claim the next chapter number. The increment must be durable before
    /// generation starts; a failed write aborts the run.
    pub async fn reserve_next(&self) -> Result<u32, LedgerError> {
        let stored = match self.chapters.find_latest().await {
            Ok(counter) => counter,
            Err(e) => {
                warn!("chapter counter read failed, treating as unset: {}", e);
                None
            }
        };
        let next = stored.map_or(1, |current| current + 1);
        self.chapters.save(next).await?;
        debug!("reserved chapter {}", next);
        Ok(next)
    }

    /// Raise the stored counter to the highest chapter evidenced by the most
    /// recent published post. Never lowers the counter and never fails: all
    /// read problems degrade to the stored value (default 1).
    pub async fn reconcile(&self) -> u32 {
        let stored = match self.chapters.find_latest().await {
            Ok(counter) => counter.unwrap_or(1),
            Err(e) => {
                warn!("chapter counter read failed during reconciliation: {}", e);
                1
            }
        };
        let published = match self.posts.find_most_recent().await {
            Ok(Some(post)) => published_chapter(&post),
            Ok(None) => None,
            Err(e) => {
                warn!("post history read failed during reconciliation: {}", e);
                None
            }
        };

        let resolved = stored.max(published.unwrap_or(0));
        if resolved > stored {
            info!(
                "raising chapter counter from {} to {} to match published history",
                stored, resolved
            );
            if let Err(e) = self.chapters.save(resolved).await {
                warn!("failed to persist reconciled chapter counter: {}", e);
            }
        }
        resolved
    }
}

fn published_chapter(post: &PublishedPost) -> Option<u32> {
    post.caption
        .as_deref()
        .and_then(parse_caption_chapter)
        .or(post.chapter)
}

/// Extract `N` from a `"Chapter N: <title>"` caption.
pub fn parse_caption_chapter(caption: &str) -> Option<u32> {
    let re = Regex::new(r"(?i)chapter\s+(\d+)").unwrap();
    re.captures(caption)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::NewPost;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemChapters {
        counter: Mutex<Option<u32>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    fn io_error() -> StoreError {
        StoreError::Io(std::io::Error::other("store offline"))
    }

    #[async_trait]
    impl ChapterRepository for MemChapters {
        async fn find_latest(&self) -> Result<Option<u32>, StoreError> {
            if self.fail_reads {
                return Err(io_error());
            }
            Ok(*self.counter.lock().unwrap())
        }

        async fn save(&self, counter: u32) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(io_error());
            }
            *self.counter.lock().unwrap() = Some(counter);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemPosts {
        posts: Mutex<Vec<PublishedPost>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl PostRepository for MemPosts {
        async fn save(&self, post: NewPost) -> Result<PublishedPost, StoreError> {
            let mut posts = self.posts.lock().unwrap();
            let record = PublishedPost {
                id: posts.len() as u32 + 1,
                external_post_id: post.external_post_id,
                content: post.content,
                media_id: post.media_id,
                media_url: None,
                chapter: post.chapter,
                caption: post.caption,
                created_at: Utc::now(),
            };
            posts.push(record.clone());
            Ok(record)
        }

        async fn find_most_recent(&self) -> Result<Option<PublishedPost>, StoreError> {
            if self.fail_reads {
                return Err(io_error());
            }
            let posts = self.posts.lock().unwrap();
            Ok(posts.iter().max_by_key(|p| p.created_at).cloned())
        }
    }

    fn post_with_caption(caption: &str, age_secs: i64) -> PublishedPost {
        PublishedPost {
            id: 0,
            external_post_id: "x".to_string(),
            content: "c".to_string(),
            media_id: "m".to_string(),
            media_url: None,
            chapter: None,
            caption: Some(caption.to_string()),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    fn ledger(chapters: MemChapters, posts: MemPosts) -> ChapterLedger {
        ChapterLedger::new(Arc::new(chapters), Arc::new(posts))
    }

    #[tokio::test]
    async fn first_reservation_yields_chapter_one() {
        let ledger = ledger(MemChapters::default(), MemPosts::default());
        assert_eq!(ledger.reserve_next().await.unwrap(), 1);
        assert_eq!(ledger.reserve_next().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reservation_persists_the_new_value() {
        let chapters = MemChapters::default();
        *chapters.counter.lock().unwrap() = Some(4);
        let chapters = Arc::new(chapters);
        let ledger = ChapterLedger::new(chapters.clone(), Arc::new(MemPosts::default()));

        assert_eq!(ledger.reserve_next().await.unwrap(), 5);
        assert_eq!(*chapters.counter.lock().unwrap(), Some(5));
    }

    #[tokio::test]
    async fn reservation_write_failure_aborts() {
        let chapters = MemChapters {
            fail_writes: true,
            ..Default::default()
        };
        let ledger = ledger(chapters, MemPosts::default());
        assert!(ledger.reserve_next().await.is_err());
    }

    #[tokio::test]
    async fn reconcile_prefers_published_evidence() {
        let chapters = MemChapters::default();
        *chapters.counter.lock().unwrap() = Some(2);
        let posts = MemPosts::default();
        posts
            .posts
            .lock()
            .unwrap()
            .extend([post_with_caption("Chapter 3: X", 60), post_with_caption("Chapter 5: Y", 1)]);

        let chapters = Arc::new(chapters);
        let ledger = ChapterLedger::new(chapters.clone(), Arc::new(posts));
        assert_eq!(ledger.reconcile().await, 5);
        assert_eq!(*chapters.counter.lock().unwrap(), Some(5));
    }

    #[tokio::test]
    async fn reconcile_without_posts_keeps_stored_counter() {
        let chapters = MemChapters::default();
        *chapters.counter.lock().unwrap() = Some(7);
        let ledger = ledger(chapters, MemPosts::default());
        assert_eq!(ledger.reconcile().await, 7);
    }

    #[tokio::test]
    async fn reconcile_never_lowers_the_counter() {
        let chapters = MemChapters::default();
        *chapters.counter.lock().unwrap() = Some(9);
        let posts = MemPosts::default();
        posts
            .posts
            .lock()
            .unwrap()
            .push(post_with_caption("Chapter 4: Old", 1));

        let chapters = Arc::new(chapters);
        let ledger = ChapterLedger::new(chapters.clone(), Arc::new(posts));
        assert_eq!(ledger.reconcile().await, 9);
        assert_eq!(*chapters.counter.lock().unwrap(), Some(9));
    }

    #[tokio::test]
    async fn reconcile_read_failures_degrade_to_default() {
        let chapters = MemChapters {
            fail_reads: true,
            ..Default::default()
        };
        let posts = MemPosts {
            fail_reads: true,
            ..Default::default()
        };
        let ledger = ledger(chapters, posts);
        assert_eq!(ledger.reconcile().await, 1);
    }

    #[tokio::test]
    async fn reconcile_falls_back_to_recorded_chapter_field() {
        let chapters = MemChapters::default();
        *chapters.counter.lock().unwrap() = Some(2);
        let posts = MemPosts::default();
        let mut post = post_with_caption("no numbering here", 1);
        post.caption = None;
        post.chapter = Some(6);
        posts.posts.lock().unwrap().push(post);

        let ledger = ledger(chapters, posts);
        assert_eq!(ledger.reconcile().await, 6);
    }

    #[test]
    fn caption_parsing_is_forgiving() {
        assert_eq!(parse_caption_chapter("Chapter 12: Ascension"), Some(12));
        assert_eq!(parse_caption_chapter("chapter 3: lowercase"), Some(3));
        assert_eq!(parse_caption_chapter("no numbering"), None);
        assert_eq!(parse_caption_chapter("Chapter X: roman"), None);
    }
}
