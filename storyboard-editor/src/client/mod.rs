//! Remote collaborators
//!
//! The editor core talks to the scene splitter and image generator only
//! through these traits; the HTTP clients in this module are the production
//! implementations and tests substitute in-memory fakes.

mod image_generator;
mod scene_splitter;

pub use image_generator::ImageGeneratorClient;
pub use scene_splitter::SceneSplitterClient;

use crate::error::{EditorError, EditorResult};
use crate::models::{
    DocumentSummary, GeneratedImage, PageRange, RemoteScene, ScenePatch, UploadReceipt,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

pub(crate) const USER_AGENT: &str = "storyboard-editor/0.1.0";
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scene splitter: documents, processing jobs and their scenes
#[async_trait]
pub trait SceneSplitterApi: Send + Sync {
    /// List uploaded documents with their processing jobs
    async fn list_documents(&self) -> EditorResult<Vec<DocumentSummary>>;

    /// Upload a document and start a segmentation job
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        pages: PageRange,
    ) -> EditorResult<UploadReceipt>;

    /// Scenes of a job, ordered by scene number
    async fn fetch_scenes(&self, job_id: Uuid) -> EditorResult<Vec<RemoteScene>>;

    /// Ordered sentences of one scene
    async fn fetch_sentences(&self, job_id: Uuid, scene_number: u32) -> EditorResult<Vec<String>>;

    /// Replace the text of several scenes
    async fn patch_scenes(&self, job_id: Uuid, patches: &[ScenePatch]) -> EditorResult<()>;

    /// Merge a run of consecutive scene numbers into the first of them
    async fn merge_scenes(&self, job_id: Uuid, scene_numbers: &[u32]) -> EditorResult<()>;

    /// Approve the segmentation of a job
    async fn approve_job(&self, job_id: Uuid) -> EditorResult<()>;
}

/// Image generator: generated illustrations per story scene
#[async_trait]
pub trait ImageGeneratorApi: Send + Sync {
    /// Generated image for a scene; `Ok(None)` means not generated yet
    async fn fetch_generated_image(
        &self,
        story_id: Uuid,
        scene_number: u32,
    ) -> EditorResult<Option<GeneratedImage>>;
}

/// Turn a non-success response into `EditorError::Remote`
pub(crate) async fn ensure_success(response: reqwest::Response) -> EditorResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(EditorError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Parse RFC 3339 or naive (assumed UTC) timestamps; anything else is dropped
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
