use crate::error::PublishError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub const VIDEO_MIME: &str = "video/mp4";

#[async_trait]
pub trait SocialPlatform: Send + Sync {
    async fn upload_media(&self, media: Vec<u8>, mime_type: &str) -> Result<String, PublishError>;
    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, PublishError>;
}

#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub external_post_id: String,
    pub media_id: String,
}

/// Two sequential platform calls: upload the video, then create the post
/// referencing it. A post-creation failure leaves the uploaded media as an
/// orphan on the platform (known gap, no compensating delete).
pub struct Publisher {
    platform: Arc<dyn SocialPlatform>,
}

impl Publisher {
    pub fn new(platform: Arc<dyn SocialPlatform>) -> Self {
        Self { platform }
    }

    pub async fn publish(
        &self,
        video: Vec<u8>,
        caption: &str,
    ) -> Result<PublishReceipt, PublishError> {
        info!("starting media upload ({} bytes, {})", video.len(), VIDEO_MIME);
        let media_id = self.platform.upload_media(video, VIDEO_MIME).await?;
        info!("media upload completed: {}", media_id);

        let external_post_id = self
            .platform
            .create_post(caption, std::slice::from_ref(&media_id))
            .await?;
        Ok(PublishReceipt {
            external_post_id,
            media_id,
        })
    }
}

/// Bearer-token REST client for the publishing platform.
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id: String,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    id: String,
}

#[derive(Deserialize)]
struct PlatformErrorBody {
    errors: Option<Vec<PlatformErrorItem>>,
}

#[derive(Deserialize)]
struct PlatformErrorItem {
    code: Option<u64>,
}

impl PlatformClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            access_token: access_token.into(),
        }
    }

    async fn error_for(response: reqwest::Response) -> PublishError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<PlatformErrorBody>(&message)
            .ok()
            .and_then(|body| body.errors)
            .and_then(|errors| errors.into_iter().find_map(|e| e.code));
        PublishError::Api {
            status,
            code,
            message,
        }
    }
}

#[async_trait]
impl SocialPlatform for PlatformClient {
    async fn upload_media(&self, media: Vec<u8>, mime_type: &str) -> Result<String, PublishError> {
        let part = Part::bytes(media)
            .file_name("media.mp4")
            .mime_str(mime_type)?;
        let form = Form::new().part("media", part);

        let response = self
            .http
            .post(format!("{}/media/upload", self.api_base))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let parsed: MediaUploadResponse = response.json().await?;
        Ok(parsed.media_id)
    }

    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, PublishError> {
        let body = serde_json::json!({
            "text": text,
            "media_ids": media_ids,
        });

        let response = self
            .http
            .post(format!("{}/posts", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let parsed: CreatePostResponse = response.json().await?;
        Ok(parsed.id)
    }
}
