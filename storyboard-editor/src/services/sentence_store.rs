//! Per-scene sentence lists
//!
//! Lists are loaded lazily and keyed by scene number. When the scene splitter
//! cannot supply a list, one is derived from the scene text with a
//! [`SentenceSplitter`]. The default [`PunctuationSplitter`] is a rough
//! approximation (split after `.`, `!` or `?` followed by whitespace); it
//! knows nothing about abbreviations, quotes or decimals.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Sentence-final punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Fallback sentence boundary policy
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Split after sentence-final punctuation followed by whitespace
#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationSplitter;

impl SentenceSplitter for PunctuationSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in SENTENCE_BOUNDARY.find_iter(text) {
            // punctuation stays with the sentence it ends
            push_fragment(&mut sentences, &text[start..boundary.start() + 1]);
            start = boundary.end();
        }
        push_fragment(&mut sentences, &text[start..]);
        sentences
    }
}

fn push_fragment(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// End of a scene's sentence list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Head,
    Tail,
}

/// Neighbor receiving moved sentences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// Neighbor scene number, if one can exist
    pub fn neighbor_of(self, scene_number: u32) -> Option<u32> {
        match self {
            Direction::Prev => scene_number.checked_sub(1).filter(|n| *n >= 1),
            Direction::Next => scene_number.checked_add(1),
        }
    }
}

/// Result of a successful sentence move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTransfer {
    pub source: u32,
    pub target: u32,
    pub moved: Vec<String>,
}

/// Sentence lists keyed by scene number
pub struct SentenceStore {
    lists: HashMap<u32, Vec<String>>,
    splitter: Arc<dyn SentenceSplitter>,
}

impl SentenceStore {
    pub fn new(splitter: Arc<dyn SentenceSplitter>) -> Self {
        Self {
            lists: HashMap::new(),
            splitter,
        }
    }

    pub fn splitter(&self) -> &Arc<dyn SentenceSplitter> {
        &self.splitter
    }

    /// Cached list for a scene
    pub fn get(&self, scene_number: u32) -> Option<&[String]> {
        self.lists.get(&scene_number).map(Vec::as_slice)
    }

    pub fn contains(&self, scene_number: u32) -> bool {
        self.lists.contains_key(&scene_number)
    }

    /// Store an authoritative list, replacing any cached one
    pub fn insert(&mut self, scene_number: u32, sentences: Vec<String>) {
        self.lists.insert(scene_number, sentences);
    }

    /// Cached list, or one derived from `text` with the fallback splitter
    pub fn derive(&mut self, scene_number: u32, text: &str) -> Vec<String> {
        let splitter = Arc::clone(&self.splitter);
        self.lists
            .entry(scene_number)
            .or_insert_with(|| splitter.split(text))
            .clone()
    }

    pub fn invalidate(&mut self, scene_number: u32) {
        self.lists.remove(&scene_number);
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }

    /// Space-joined text of a cached list
    pub fn joined(&self, scene_number: u32) -> Option<String> {
        self.get(scene_number).map(|sentences| sentences.join(" "))
    }

    /// Move up to `count` sentences from one end of a scene to a neighbor
    ///
    /// Head sentences go to the previous scene's tail, tail sentences to the
    /// next scene's head. Head to next and tail to prev would reverse reading
    /// order and are rejected. Both lists must already be loaded. Returns
    /// `None` when nothing moved.
    pub fn move_sentences(
        &mut self,
        scene_number: u32,
        edge: Edge,
        count: usize,
        direction: Direction,
    ) -> Option<SentenceTransfer> {
        match (edge, direction) {
            (Edge::Head, Direction::Next) | (Edge::Tail, Direction::Prev) => return None,
            _ => {}
        }
        if count == 0 {
            return None;
        }
        let target = direction.neighbor_of(scene_number)?;
        if !self.lists.contains_key(&target) {
            return None;
        }

        let source_list = self.lists.get_mut(&scene_number)?;
        if source_list.is_empty() {
            return None;
        }
        let take = count.min(source_list.len());
        let moved: Vec<String> = match edge {
            Edge::Head => source_list.drain(..take).collect(),
            Edge::Tail => {
                let from = source_list.len() - take;
                source_list.drain(from..).collect()
            }
        };

        let target_list = self.lists.get_mut(&target)?;
        match direction {
            Direction::Prev => target_list.extend(moved.iter().cloned()),
            Direction::Next => {
                target_list.splice(0..0, moved.iter().cloned());
            }
        }

        debug!(
            source = scene_number,
            target,
            moved = moved.len(),
            "Moved sentences between scenes"
        );
        Some(SentenceTransfer {
            source: scene_number,
            target,
            moved,
        })
    }
}

impl Default for SentenceStore {
    fn default() -> Self {
        Self::new(Arc::new(PunctuationSplitter))
    }
}
