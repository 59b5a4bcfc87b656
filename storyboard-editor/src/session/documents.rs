//! Uploaded documents and their processing jobs

use crate::client::SceneSplitterApi;
use crate::error::{EditorError, EditorResult};
use crate::models::{DocumentSummary, PageRange, ProcessingJobRef, UploadReceipt};
use chrono::Utc;
use std::sync::Arc;
use storyboard_common::events::{EventBus, StoryboardEvent};
use tracing::{info, warn};
use uuid::Uuid;

pub struct DocumentLibrary {
    api: Arc<dyn SceneSplitterApi>,
    events: EventBus,
    documents: Vec<DocumentSummary>,
    active: Option<Uuid>,
    loading: bool,
    last_error: Option<String>,
}

impl DocumentLibrary {
    pub fn new(api: Arc<dyn SceneSplitterApi>, events: EventBus) -> Self {
        Self {
            api,
            events,
            documents: Vec::new(),
            active: None,
            loading: false,
            last_error: None,
        }
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replace the document list from the scene splitter
    pub async fn load_documents(&mut self) -> EditorResult<usize> {
        self.loading = true;
        self.last_error = None;
        let result = self.api.list_documents().await;
        self.loading = false;

        match result {
            Ok(documents) => {
                self.documents = documents;
                Ok(self.documents.len())
            }
            Err(e) => {
                self.record_error("load_documents", &e);
                Err(e)
            }
        }
    }

    /// Upload a document and make it active
    ///
    /// The new job is prepended to a known document, or a new document entry
    /// is prepended to the list.
    pub async fn upload(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        pages: PageRange,
    ) -> EditorResult<UploadReceipt> {
        self.last_error = None;
        let size = bytes.len() as u64;
        let receipt = match self.api.upload_document(file_name, bytes, pages).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.record_error("upload", &e);
                return Err(e);
            }
        };

        let job = ProcessingJobRef {
            id: receipt.job_id,
            status: receipt.status.clone(),
            current_step: None,
        };
        match self
            .documents
            .iter_mut()
            .find(|d| d.id == receipt.document_id)
        {
            Some(existing) => existing.processing_jobs.insert(0, job),
            None => self.documents.insert(
                0,
                DocumentSummary {
                    id: receipt.document_id,
                    filename: file_name.to_string(),
                    file_size: Some(size),
                    mime_type: None,
                    uploaded_at: Some(Utc::now()),
                    processing_jobs: vec![job],
                },
            ),
        }
        self.active = Some(receipt.document_id);

        info!(
            document_id = %receipt.document_id,
            job_id = %receipt.job_id,
            file_name,
            "Document uploaded"
        );
        Ok(receipt)
    }

    /// Select a known document; unknown ids are ignored
    pub fn set_active_document(&mut self, id: Uuid) -> bool {
        if self.documents.iter().any(|d| d.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_document(&self) -> Option<&DocumentSummary> {
        let id = self.active?;
        self.documents.iter().find(|d| d.id == id)
    }

    fn record_error(&mut self, operation: &str, error: &EditorError) {
        warn!(operation, error = %error, "Document library operation failed");
        self.last_error = Some(error.to_string());
        self.events.emit_lossy(StoryboardEvent::SessionError {
            operation: operation.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}
