//! storyboard-editor library interface
//!
//! Scene segmentation and merge engine plus the bounded-concurrency
//! illustration generation and polling controller. The binary and the
//! integration tests drive everything through the session types.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod projection;
pub mod services;
pub mod session;

pub use crate::error::{EditorError, EditorResult};
pub use crate::session::{DocumentLibrary, ReviewSession, StorySession};
