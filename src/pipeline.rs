use crate::composer::MediaComposer;
use crate::error::RunError;
use crate::generator::StoryGenerator;
use crate::ledger::ChapterLedger;
use crate::models::{ContentType, NewPost, PromptTemplate, RunOutcome};
use crate::prompts::default_template;
use crate::publisher::Publisher;
use crate::store::{PostRepository, PromptStore};
use crate::tts::SpeechSynthesizer;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sequences one publish run: reserve chapter → generate → synthesize →
/// compose → publish → record. No retries; the first failure ends the run.
pub struct Pipeline {
    prompts: Arc<dyn PromptStore>,
    posts: Arc<dyn PostRepository>,
    ledger: ChapterLedger,
    generator: StoryGenerator,
    speech: Arc<dyn SpeechSynthesizer>,
    composer: MediaComposer,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(
        prompts: Arc<dyn PromptStore>,
        posts: Arc<dyn PostRepository>,
        ledger: ChapterLedger,
        generator: StoryGenerator,
        speech: Arc<dyn SpeechSynthesizer>,
        composer: MediaComposer,
        publisher: Publisher,
    ) -> Self {
        Self {
            prompts,
            posts,
            ledger,
            generator,
            speech,
            composer,
            publisher,
        }
    }

    pub async fn run(&self, content_type: ContentType) -> Result<RunOutcome, RunError> {
        info!("starting publish run ({:?})", content_type);

        let reconciled = self.ledger.reconcile().await;
        debug!("chapter counter reconciled at {}", reconciled);
        let chapter = self.ledger.reserve_next().await?;
        info!("reserved chapter {}", chapter);

        let template = self.active_template(content_type).await;
        let story = self.generator.generate(&template, chapter).await?;
        let caption = format!("Chapter {}: {}", chapter, story.title);
        info!("caption: {}", caption);

        let audio = self.speech.synthesize(&story.narration).await?;
        let video = self.composer.compose(&audio).await?;
        let receipt = self.publisher.publish(video, &caption).await?;
        info!(
            "published post {} with media {}",
            receipt.external_post_id, receipt.media_id
        );

        let record = NewPost {
            external_post_id: receipt.external_post_id.clone(),
            content: story.narration.clone(),
            media_id: receipt.media_id.clone(),
            chapter: Some(chapter),
            caption: Some(caption.clone()),
        };
        if let Err(e) = self.posts.save(record).await {
            // The platform-side post exists; the next run's reconciliation
            // recovers the chapter number from it.
            error!(
                "post {} published but the local record write failed: {}",
                receipt.external_post_id, e
            );
            return Err(RunError::Record(e));
        }

        Ok(RunOutcome {
            chapter,
            caption,
            content: story.narration,
            external_post_id: receipt.external_post_id,
            media_id: receipt.media_id,
        })
    }

    async fn active_template(&self, content_type: ContentType) -> PromptTemplate {
        match self.prompts.get_active(content_type).await {
            Ok(Some(template)) => template,
            Ok(None) => {
                info!(
                    "no active prompt template for {:?}, using built-in default",
                    content_type
                );
                default_template(content_type)
            }
            Err(e) => {
                warn!("prompt store read failed, using built-in default: {}", e);
                default_template(content_type)
            }
        }
    }
}
