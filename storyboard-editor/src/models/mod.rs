//! Data models for storyboard-editor

pub mod remote;
pub mod scene;

pub use remote::{
    status_label, DocumentSummary, GeneratedImage, PageRange, ProcessingJobRef, RemoteScene,
    ScenePatch, UploadReceipt,
};
pub use scene::{Illustration, Scene, SceneId, SceneIdArena, SentenceRange};
pub use storyboard_common::SceneStatus;
