//! Scene, sentence range and illustration records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use storyboard_common::SceneStatus;

/// Arena-issued scene identity
///
/// Identity survives renumbering; split and merge issue fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene-{}", self.0)
    }
}

/// Monotonic scene id issuer
#[derive(Debug, Default, Clone)]
pub struct SceneIdArena {
    last: u64,
}

impl SceneIdArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id (first id is 1)
    pub fn issue(&mut self) -> SceneId {
        self.last += 1;
        SceneId(self.last)
    }
}

/// Inclusive range of global sentence indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRange {
    pub start: usize,
    pub end: usize,
}

impl SentenceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of sentences covered
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx <= self.end
    }
}

/// One contiguous span of sentences presented as an editable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    /// 1-based position; recomputed from list order after every edit
    pub scene_number: u32,
    pub title: String,
    pub text: String,
    pub status: SceneStatus,
    /// Global sentence span (local stories only)
    pub range: Option<SentenceRange>,
    /// Sentence count reported by the scene splitter (remote jobs only)
    pub sentence_count: Option<usize>,
}

impl Scene {
    /// Display title for a scene number
    pub fn title_for(scene_number: u32) -> String {
        format!("Scene {}", scene_number)
    }

    /// Best known sentence count
    pub fn sentence_count(&self) -> usize {
        match (self.range, self.sentence_count) {
            (Some(range), _) => range.len(),
            (None, Some(count)) => count,
            (None, None) => 0,
        }
    }
}

/// Illustration attached to a scene, keyed 1:1 by scene id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Illustration {
    pub id: String,
    pub scene_id: SceneId,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub prompt_preview: Option<String>,
    /// Identity of the generated image on the remote side, if any
    pub source_image_id: Option<String>,
}
