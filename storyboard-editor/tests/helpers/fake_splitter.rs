//! Fake scene splitter
//!
//! Keeps one job's scenes as sentence lists. Merges behave like the real
//! service: texts are joined with a blank line and later scenes shift down.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use storyboard_editor::client::SceneSplitterApi;
use storyboard_editor::error::{EditorError, EditorResult};
use storyboard_editor::models::{
    DocumentSummary, PageRange, ProcessingJobRef, RemoteScene, ScenePatch, UploadReceipt,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct FakeScene {
    text: String,
    sentences: Vec<String>,
}

pub struct FakeSceneSplitter {
    pub job_id: Uuid,
    scenes: Mutex<Vec<FakeScene>>,
    documents: Mutex<Vec<DocumentSummary>>,
    calls: Mutex<Vec<String>>,
    merges: Mutex<Vec<Vec<u32>>>,
    patches: Mutex<Vec<Vec<ScenePatch>>>,
    fail_fetch: AtomicBool,
    fail_merge_at: Mutex<Option<u32>>,
}

impl FakeSceneSplitter {
    /// Job whose scenes hold the given sentence lists
    pub fn with_scenes(scenes: Vec<Vec<String>>) -> Self {
        let scenes = scenes
            .into_iter()
            .map(|sentences| FakeScene {
                text: sentences.join(" "),
                sentences,
            })
            .collect();
        Self {
            job_id: Uuid::new_v4(),
            scenes: Mutex::new(scenes),
            documents: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            merges: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_merge_at: Mutex::new(None),
        }
    }

    /// Job with scenes of the given sentence counts ("S1." "S2." ... per scene)
    pub fn with_counts(counts: &[usize]) -> Self {
        Self::with_scenes(
            counts
                .iter()
                .enumerate()
                .map(|(i, count)| super::sentences(&format!("S{}-", i + 1), *count))
                .collect(),
        )
    }

    pub fn add_document(&self, document: DocumentSummary) {
        self.documents.lock().unwrap().push(document);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Reject merge requests whose first scene number is `first`
    pub fn fail_merge_starting_at(&self, first: u32) {
        *self.fail_merge_at.lock().unwrap() = Some(first);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn merges(&self) -> Vec<Vec<u32>> {
        self.merges.lock().unwrap().clone()
    }

    pub fn patches(&self) -> Vec<Vec<ScenePatch>> {
        self.patches.lock().unwrap().clone()
    }

    pub fn scene_texts(&self) -> Vec<String> {
        self.scenes
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.text.clone())
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check_job(&self, job_id: Uuid) -> EditorResult<()> {
        if job_id == self.job_id {
            Ok(())
        } else {
            Err(EditorError::Remote {
                status: 404,
                message: format!("job {} not found", job_id),
            })
        }
    }
}

#[async_trait]
impl SceneSplitterApi for FakeSceneSplitter {
    async fn list_documents(&self) -> EditorResult<Vec<DocumentSummary>> {
        self.record("list_documents");
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(EditorError::Network("connection refused".to_string()));
        }
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn upload_document(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
        _pages: PageRange,
    ) -> EditorResult<UploadReceipt> {
        self.record(format!("upload {}", file_name));
        let mut documents = self.documents.lock().unwrap();
        let document_id = documents
            .iter()
            .find(|d| d.filename == file_name)
            .map(|d| d.id)
            .unwrap_or_else(Uuid::new_v4);
        let job_id = Uuid::new_v4();
        if !documents.iter().any(|d| d.id == document_id) {
            documents.push(DocumentSummary {
                id: document_id,
                filename: file_name.to_string(),
                file_size: None,
                mime_type: None,
                uploaded_at: None,
                processing_jobs: vec![ProcessingJobRef {
                    id: job_id,
                    status: "pending".to_string(),
                    current_step: None,
                }],
            });
        }
        Ok(UploadReceipt {
            job_id,
            document_id,
            status: "pending".to_string(),
        })
    }

    async fn fetch_scenes(&self, job_id: Uuid) -> EditorResult<Vec<RemoteScene>> {
        self.record("fetch_scenes");
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(EditorError::Network("connection refused".to_string()));
        }
        self.check_job(job_id)?;
        Ok(self
            .scenes
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, s)| RemoteScene {
                scene_number: (i + 1) as u32,
                text: s.text.clone(),
                sentence_count: s.sentences.len(),
            })
            .collect())
    }

    async fn fetch_sentences(&self, job_id: Uuid, scene_number: u32) -> EditorResult<Vec<String>> {
        self.record(format!("fetch_sentences {}", scene_number));
        self.check_job(job_id)?;
        self.scenes
            .lock()
            .unwrap()
            .get(scene_number as usize - 1)
            .map(|s| s.sentences.clone())
            .ok_or(EditorError::Remote {
                status: 404,
                message: format!("scene {} not found", scene_number),
            })
    }

    async fn patch_scenes(&self, job_id: Uuid, patches: &[ScenePatch]) -> EditorResult<()> {
        self.record(format!("patch {}", patches.len()));
        self.check_job(job_id)?;
        let mut scenes = self.scenes.lock().unwrap();
        for patch in patches {
            if let Some(scene) = scenes.get_mut(patch.scene_number as usize - 1) {
                scene.text = patch.scene_text.clone();
            }
        }
        self.patches.lock().unwrap().push(patches.to_vec());
        Ok(())
    }

    async fn merge_scenes(&self, job_id: Uuid, scene_numbers: &[u32]) -> EditorResult<()> {
        self.record(format!("merge {:?}", scene_numbers));
        self.check_job(job_id)?;
        if *self.fail_merge_at.lock().unwrap() == scene_numbers.first().copied() {
            return Err(EditorError::Remote {
                status: 500,
                message: "merge failed".to_string(),
            });
        }

        let mut scenes = self.scenes.lock().unwrap();
        let first = scene_numbers[0] as usize - 1;
        let last = *scene_numbers.last().unwrap() as usize - 1;
        if last >= scenes.len() {
            return Err(EditorError::Remote {
                status: 400,
                message: "scene numbers out of range".to_string(),
            });
        }
        let merged: Vec<FakeScene> = scenes.drain(first..=last).collect();
        let combined = FakeScene {
            text: merged
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
            sentences: merged.iter().flat_map(|s| s.sentences.clone()).collect(),
        };
        scenes.insert(first, combined);
        self.merges.lock().unwrap().push(scene_numbers.to_vec());
        Ok(())
    }

    async fn approve_job(&self, job_id: Uuid) -> EditorResult<()> {
        self.record("approve");
        self.check_job(job_id)
    }
}
