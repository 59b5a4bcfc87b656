//! Records exchanged with the scene splitter and image generator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing job attached to an uploaded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJobRef {
    pub id: Uuid,
    pub status: String,
    pub current_step: Option<String>,
}

/// Uploaded document with its processing jobs (newest first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub processing_jobs: Vec<ProcessingJobRef>,
}

impl DocumentSummary {
    /// Most recent processing job, if any
    pub fn latest_job(&self) -> Option<&ProcessingJobRef> {
        self.processing_jobs.first()
    }
}

/// Inclusive 1-based page range to extract from an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start_page: u32,
    pub end_page: u32,
}

impl Default for PageRange {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: 999,
        }
    }
}

/// Scene splitter answer to an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub status: String,
}

/// Scene as stored by the scene splitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteScene {
    pub scene_number: u32,
    pub text: String,
    pub sentence_count: usize,
}

/// Text replacement for one scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePatch {
    pub scene_number: u32,
    pub scene_text: String,
}

/// Generated image reported by the image generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_id: String,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub prompt_text: Option<String>,
}

/// Human label for a processing job status key
///
/// Unknown keys pass through unchanged; a missing status is "Unknown".
pub fn status_label(status: Option<&str>) -> String {
    let Some(status) = status else {
        return "Unknown".to_string();
    };
    let label = match status.to_lowercase().as_str() {
        "pending" => "Pending",
        "extracting" => "Extracting text",
        "splitting" => "Splitting scenes",
        "ready-for-review" => "Ready for review",
        "approved" => "Approved",
        "completed" => "Completed",
        "failed" => "Failed",
        "cancelled" => "Cancelled",
        _ => return status.to_string(),
    };
    label.to_string()
}
