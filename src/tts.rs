use crate::error::{ConfigError, SynthesisError};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info};

pub const SPEECH_MODEL_ID: &str = "eleven_multilingual_v2";
const API_KEY_HEADER: &str = "xi-api-key";

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Streaming text-to-speech client for ElevenLabs-compatible endpoints.
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    voice_id: String,
}

impl ElevenLabsClient {
    /// Fails fast when the credential or voice id is absent, before any
    /// network use.
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let voice_id = voice_id.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::Empty("speech API key"));
        }
        if voice_id.trim().is_empty() {
            return Err(ConfigError::Empty("speech voice id"));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base: api_base.into(),
            voice_id,
        })
    }

    /// Cheap credential/connectivity probe, run before every synthesis call
    /// so bad credentials fail with a clear error instead of a garbled
    /// synthesis response.
    pub async fn check_credentials(&self) -> Result<(), SynthesisError> {
        debug!("checking speech provider credentials");
        let response = self
            .http
            .get(format!("{}/v1/user", self.api_base))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::CredentialCheck { status, message });
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        self.check_credentials().await?;

        info!("starting speech synthesis ({} chars)", text.len());
        let body = serde_json::json!({
            "model_id": SPEECH_MODEL_ID,
            "text": text,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.7,
                "use_speaker_boost": true,
            },
        });

        let response = self
            .http
            .post(format!(
                "{}/v1/text-to-speech/{}/stream",
                self.api_base, self.voice_id
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api { status, message });
        }

        let mut stream = response.bytes_stream();
        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        info!("speech synthesis completed ({} bytes)", audio.len());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected_at_construction() {
        assert!(matches!(
            ElevenLabsClient::new("", "voice", "https://api.test"),
            Err(ConfigError::Empty("speech API key"))
        ));
    }

    #[test]
    fn empty_voice_id_is_rejected_at_construction() {
        assert!(matches!(
            ElevenLabsClient::new("key", "  ", "https://api.test"),
            Err(ConfigError::Empty("speech voice id"))
        ));
    }
}
