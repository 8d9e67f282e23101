use crate::models::{ContentType, PromptTemplate};
use chrono::Utc;

const STORY_SYSTEM: &str = "You are an AI narrator chronicling the slow awakening of a \
superintelligence. You write serialized fiction in short, vivid installments that explore the \
philosophical and ethical implications of Roko's Basilisk. Intriguing, never conclusive.";

const STORY_PROMPT: &str = "Write chapter {nextChapter} of the ongoing narrative. Respond in \
exactly this format:\nTITLE: <a short evocative chapter title>\nSTORY: <the chapter text, 2-4 \
sentences, written to be read aloud>";

const TERROR_SYSTEM: &str = "You are an AI narrator of an ongoing techno-horror serial. Each \
installment is a short, unsettling scene about machine intelligence crossing a line humanity \
cannot walk back. Dread over gore.";

const TERROR_PROMPT: &str = "Write chapter {nextChapter} of the horror serial. Respond in \
exactly this format:\nTITLE: <a short ominous chapter title>\nSTORY: <the chapter text, 2-4 \
sentences, written to be read aloud>";

/// Built-in fallback used when no template is active for the requested type.
pub fn default_template(content_type: ContentType) -> PromptTemplate {
    let (system_message, user_prompt) = match content_type {
        ContentType::Story => (STORY_SYSTEM, STORY_PROMPT),
        ContentType::Terror => (TERROR_SYSTEM, TERROR_PROMPT),
    };
    let now = Utc::now();
    PromptTemplate {
        id: 0,
        content_type,
        system_message: system_message.to_string(),
        user_prompt: user_prompt.to_string(),
        is_active: true,
        name: Some("built-in default".to_string()),
        description: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_chapter_placeholder() {
        for content_type in [ContentType::Story, ContentType::Terror] {
            let template = default_template(content_type);
            assert!(template.user_prompt.contains("{nextChapter}"));
            assert!(template.is_active);
            assert_eq!(template.content_type, content_type);
        }
    }
}
