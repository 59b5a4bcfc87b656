//! Image generator HTTP client

use super::{ensure_success, parse_timestamp, ImageGeneratorApi, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{EditorError, EditorResult};
use crate::models::GeneratedImage;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct GeneratedImageResponse {
    image: ImageDto,
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    id: serde_json::Value,
    url: String,
    created_at: Option<String>,
    prompt_text: Option<String>,
}

impl From<ImageDto> for GeneratedImage {
    fn from(dto: ImageDto) -> Self {
        // Numeric and string ids both appear in the wild
        let image_id = match dto.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            image_id,
            url: dto.url,
            created_at: parse_timestamp(dto.created_at.as_deref()),
            prompt_text: dto.prompt_text,
        }
    }
}

/// Image generator client
pub struct ImageGeneratorClient {
    http_client: reqwest::Client,
    base_url: String,
    expires_seconds: Option<u64>,
}

impl ImageGeneratorClient {
    pub fn new(base_url: &str, expires_seconds: Option<u64>) -> EditorResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EditorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            expires_seconds,
        })
    }

    fn image_url(&self, story_id: Uuid, scene_number: u32) -> String {
        let mut url = format!(
            "{}/stories/{}/scenes/{}/image",
            self.base_url, story_id, scene_number
        );
        if let Some(expires) = self.expires_seconds.filter(|s| *s > 0) {
            url.push_str(&format!("?expires_seconds={}", expires));
        }
        url
    }
}

#[async_trait]
impl ImageGeneratorApi for ImageGeneratorClient {
    async fn fetch_generated_image(
        &self,
        story_id: Uuid,
        scene_number: u32,
    ) -> EditorResult<Option<GeneratedImage>> {
        let url = self.image_url(story_id, scene_number);
        trace!(url = %url, "Fetching generated image");

        let response = self.http_client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let body: GeneratedImageResponse = response.json().await?;
        Ok(Some(body.image.into()))
    }
}
