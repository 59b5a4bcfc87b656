//! Scene splitter HTTP client

use super::{ensure_success, parse_timestamp, SceneSplitterApi, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{EditorError, EditorResult};
use crate::models::{
    DocumentSummary, PageRange, ProcessingJobRef, RemoteScene, ScenePatch, UploadReceipt,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    documents: Vec<DocumentDto>,
}

#[derive(Debug, Deserialize)]
struct DocumentDto {
    id: Uuid,
    filename: String,
    file_size: Option<u64>,
    mime_type: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    processing_jobs: Vec<ProcessingJobDto>,
}

#[derive(Debug, Deserialize)]
struct ProcessingJobDto {
    id: Uuid,
    status: String,
    current_step: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    job_id: Uuid,
    document_id: Uuid,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ScenesResponse {
    scenes: Vec<SceneDto>,
}

#[derive(Debug, Deserialize)]
struct SceneDto {
    scene_number: u32,
    scene_text: String,
    #[serde(default)]
    sentence_count: usize,
}

#[derive(Debug, Deserialize)]
struct SentencesResponse {
    sentences: Vec<SentenceDto>,
}

#[derive(Debug, Deserialize)]
struct SentenceDto {
    text: String,
}

#[derive(Debug, Serialize)]
struct PatchRequest<'a> {
    scenes: &'a [ScenePatch],
}

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    scene_numbers: &'a [u32],
}

impl From<DocumentDto> for DocumentSummary {
    fn from(dto: DocumentDto) -> Self {
        Self {
            id: dto.id,
            filename: dto.filename,
            file_size: dto.file_size,
            mime_type: dto.mime_type,
            uploaded_at: parse_timestamp(dto.created_at.as_deref()),
            processing_jobs: dto
                .processing_jobs
                .into_iter()
                .map(|job| ProcessingJobRef {
                    id: job.id,
                    status: job.status,
                    current_step: job.current_step,
                })
                .collect(),
        }
    }
}

/// Scene splitter client
pub struct SceneSplitterClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SceneSplitterClient {
    /// Create a client for `base_url` (trailing slash tolerated)
    pub fn new(base_url: &str) -> EditorResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| EditorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn job_url(&self, job_id: Uuid, tail: &str) -> String {
        format!("{}/processing-jobs/{}{}", self.base_url, job_id, tail)
    }
}

#[async_trait]
impl SceneSplitterApi for SceneSplitterClient {
    async fn list_documents(&self) -> EditorResult<Vec<DocumentSummary>> {
        let url = format!("{}/documents", self.base_url);
        debug!(url = %url, "Listing documents");

        let response = ensure_success(self.http_client.get(&url).send().await?).await?;
        let body: DocumentsResponse = response.json().await?;
        Ok(body.documents.into_iter().map(DocumentSummary::from).collect())
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        pages: PageRange,
    ) -> EditorResult<UploadReceipt> {
        let url = format!("{}/split-scenes/", self.base_url);
        debug!(url = %url, file_name, size = bytes.len(), "Uploading document");

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new()
            .part("file", part)
            .text("start_page", pages.start_page.to_string())
            .text("end_page", pages.end_page.to_string());

        let response =
            ensure_success(self.http_client.post(&url).multipart(form).send().await?).await?;
        let body: UploadResponse = response.json().await?;
        Ok(UploadReceipt {
            job_id: body.job_id,
            document_id: body.document_id,
            status: body.status,
        })
    }

    async fn fetch_scenes(&self, job_id: Uuid) -> EditorResult<Vec<RemoteScene>> {
        let url = self.job_url(job_id, "/scenes");
        let response = ensure_success(self.http_client.get(&url).send().await?).await?;
        let body: ScenesResponse = response.json().await?;

        let mut scenes: Vec<RemoteScene> = body
            .scenes
            .into_iter()
            .map(|dto| RemoteScene {
                scene_number: dto.scene_number,
                text: dto.scene_text,
                sentence_count: dto.sentence_count,
            })
            .collect();
        scenes.sort_by_key(|s| s.scene_number);
        Ok(scenes)
    }

    async fn fetch_sentences(&self, job_id: Uuid, scene_number: u32) -> EditorResult<Vec<String>> {
        let url = self.job_url(job_id, &format!("/scenes/{}/sentences", scene_number));
        let response = ensure_success(self.http_client.get(&url).send().await?).await?;
        let body: SentencesResponse = response.json().await?;
        Ok(body.sentences.into_iter().map(|s| s.text).collect())
    }

    async fn patch_scenes(&self, job_id: Uuid, patches: &[ScenePatch]) -> EditorResult<()> {
        let url = self.job_url(job_id, "/scenes");
        debug!(%job_id, count = patches.len(), "Patching scene texts");
        ensure_success(
            self.http_client
                .patch(&url)
                .json(&PatchRequest { scenes: patches })
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn merge_scenes(&self, job_id: Uuid, scene_numbers: &[u32]) -> EditorResult<()> {
        let url = self.job_url(job_id, "/scenes/merge");
        debug!(%job_id, ?scene_numbers, "Merging scenes");
        ensure_success(
            self.http_client
                .post(&url)
                .json(&MergeRequest { scene_numbers })
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn approve_job(&self, job_id: Uuid) -> EditorResult<()> {
        let url = self.job_url(job_id, "/approve");
        ensure_success(self.http_client.post(&url).send().await?).await?;
        Ok(())
    }
}
