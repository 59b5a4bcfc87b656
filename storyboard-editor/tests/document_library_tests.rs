//! Integration tests for the document library

mod helpers;

use helpers::FakeSceneSplitter;
use std::sync::Arc;
use storyboard_common::events::EventBus;
use storyboard_editor::models::{DocumentSummary, PageRange};
use storyboard_editor::DocumentLibrary;
use uuid::Uuid;

fn document(filename: &str) -> DocumentSummary {
    DocumentSummary {
        id: Uuid::new_v4(),
        filename: filename.to_string(),
        file_size: Some(2048),
        mime_type: Some("application/pdf".to_string()),
        uploaded_at: None,
        processing_jobs: Vec::new(),
    }
}

fn library(fake: &Arc<FakeSceneSplitter>) -> DocumentLibrary {
    DocumentLibrary::new(Arc::clone(fake) as Arc<_>, EventBus::new(64))
}

#[tokio::test]
async fn test_load_documents() {
    let fake = Arc::new(FakeSceneSplitter::with_counts(&[3]));
    fake.add_document(document("novel.pdf"));
    fake.add_document(document("notes.pdf"));
    let mut library = library(&fake);

    assert_eq!(library.load_documents().await.unwrap(), 2);
    assert_eq!(library.documents()[1].filename, "notes.pdf");
    assert!(library.last_error().is_none());
    assert!(library.active_document().is_none());
}

#[tokio::test]
async fn test_load_failure_recorded() {
    let fake = Arc::new(FakeSceneSplitter::with_counts(&[3]));
    fake.set_fail_fetch(true);
    let mut library = library(&fake);

    assert!(library.load_documents().await.is_err());
    assert!(library.last_error().is_some());
    assert!(!library.is_loading());
}

#[tokio::test]
async fn test_upload_new_document_is_prepended_and_active() {
    let fake = Arc::new(FakeSceneSplitter::with_counts(&[3]));
    fake.add_document(document("older.pdf"));
    let mut library = library(&fake);
    library.load_documents().await.unwrap();

    let receipt = library
        .upload("fresh.pdf", b"%PDF-1.4".to_vec(), PageRange::default())
        .await
        .unwrap();

    assert_eq!(library.documents().len(), 2);
    let active = library.active_document().unwrap();
    assert_eq!(active.id, receipt.document_id);
    assert_eq!(active.filename, "fresh.pdf");
    assert_eq!(active.file_size, Some(8));
    assert_eq!(active.latest_job().unwrap().id, receipt.job_id);
    assert_eq!(library.documents()[0].id, receipt.document_id);
}

#[tokio::test]
async fn test_upload_known_document_prepends_job() {
    let fake = Arc::new(FakeSceneSplitter::with_counts(&[3]));
    fake.add_document(document("novel.pdf"));
    let mut library = library(&fake);
    library.load_documents().await.unwrap();
    let known = library.documents()[0].id;

    let first = library
        .upload("novel.pdf", Vec::new(), PageRange::default())
        .await
        .unwrap();
    let second = library
        .upload("novel.pdf", Vec::new(), PageRange::default())
        .await
        .unwrap();

    assert_eq!(first.document_id, known);
    assert_eq!(library.documents().len(), 1);
    let jobs: Vec<Uuid> = library.documents()[0]
        .processing_jobs
        .iter()
        .map(|j| j.id)
        .collect();
    assert_eq!(jobs, vec![second.job_id, first.job_id]);
}

#[tokio::test]
async fn test_set_active_ignores_unknown_ids() {
    let fake = Arc::new(FakeSceneSplitter::with_counts(&[3]));
    fake.add_document(document("novel.pdf"));
    let mut library = library(&fake);
    library.load_documents().await.unwrap();
    let id = library.documents()[0].id;

    assert!(!library.set_active_document(Uuid::new_v4()));
    assert!(library.set_active_document(id));
    assert_eq!(library.active_document().unwrap().id, id);
}
