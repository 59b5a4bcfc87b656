//! Session objects
//!
//! One session per document or job, constructed explicitly and dropped (or
//! reset) when the user moves on.

mod documents;
mod review;
mod story;

pub use documents::DocumentLibrary;
pub use review::ReviewSession;
pub use story::StorySession;
