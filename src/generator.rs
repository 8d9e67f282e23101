use crate::error::GenerationError;
use crate::llm::LanguageModel;
use crate::models::{GeneratedStory, PromptTemplate};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_TITLE: &str = "Untitled";
const CHAPTER_PLACEHOLDER: &str = "{nextChapter}";
const MAX_COMPLETION_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.8;

pub struct StoryGenerator {
    model: Arc<dyn LanguageModel>,
}

impl StoryGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// One completion call, then best-effort extraction of the `TITLE:` and
    /// `STORY:` lines. Model output is unstructured, so a missing title gets
    /// the fixed default and a missing story line means the whole response
    /// becomes the narration.
    pub async fn generate(
        &self,
        template: &PromptTemplate,
        chapter: u32,
    ) -> Result<GeneratedStory, GenerationError> {
        let user_prompt = template
            .user_prompt
            .replace(CHAPTER_PLACEHOLDER, &chapter.to_string());
        debug!("requesting story for chapter {}", chapter);

        let raw = self
            .model
            .complete(
                &template.system_message,
                &user_prompt,
                MAX_COMPLETION_TOKENS,
                TEMPERATURE,
            )
            .await?;

        let (title, narration) = extract_story(&raw);
        let title = title.unwrap_or_else(|| {
            warn!("model response had no TITLE line, using default title");
            DEFAULT_TITLE.to_string()
        });
        let narration = narration.unwrap_or_else(|| {
            warn!("model response had no STORY line, using full response as narration");
            raw.trim().to_string()
        });
        if narration.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        info!("generated \"{}\" ({} chars)", title, narration.len());
        Ok(GeneratedStory { title, narration })
    }
}

fn extract_story(raw: &str) -> (Option<String>, Option<String>) {
    let title_re = Regex::new(r"(?im)^\s*TITLE:\s*(.+?)\s*$").unwrap();
    let story_re = Regex::new(r"(?is)\bSTORY:\s*(.+)").unwrap();

    let title = title_re
        .captures(raw)
        .map(|captures| captures[1].trim().to_string())
        .filter(|t| !t.is_empty());
    let story = story_re
        .captures(raw)
        .map(|captures| captures[1].trim().to_string())
        .filter(|s| !s.is_empty());
    (title, story)
}
