//! Scene segmentation model
//!
//! Owns the ordered scene list and the partition invariant: in a local story
//! scene ranges are contiguous, gapless and cover every sentence exactly
//! once. Scene numbers, titles and (locally) text are positional and are
//! recomputed after every structural edit.
//!
//! Invalid requests are no-ops: mutators return `false` / `None` instead of
//! errors.

use crate::models::{RemoteScene, Scene, SceneId, SceneIdArena, SceneStatus, SentenceRange};
use crate::services::sentence_store::Direction;
use tracing::debug;

/// Minimum chunk size used by the initial partition
pub const MIN_CHUNK_SENTENCES: usize = 3;

/// Smallest range a boundary edit may leave behind
pub const MIN_SCENE_SENTENCES: usize = 2;

/// Where scene text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Authority {
    /// Self-contained story: one global sentence sequence, scenes hold ranges
    Local { sentences: Vec<String> },
    /// Scene splitter owns the scenes; ranges are unknown
    Remote,
}

/// Edge of a scene range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdge {
    Start,
    End,
}

/// One-sentence boundary step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Move the edge one sentence towards the document start
    Decrease,
    /// Move the edge one sentence towards the document end
    Increase,
}

/// Ordered scene list plus the id arena
#[derive(Debug, Clone)]
pub struct SegmentationModel {
    authority: Authority,
    scenes: Vec<Scene>,
    ids: SceneIdArena,
}

impl SegmentationModel {
    /// Local model over a global sentence sequence (no scenes yet)
    pub fn local(sentences: Vec<String>) -> Self {
        Self {
            authority: Authority::Local { sentences },
            scenes: Vec::new(),
            ids: SceneIdArena::new(),
        }
    }

    /// Empty server-authoritative model
    pub fn remote() -> Self {
        Self {
            authority: Authority::Remote,
            scenes: Vec::new(),
            ids: SceneIdArena::new(),
        }
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn is_local(&self) -> bool {
        matches!(self.authority, Authority::Local { .. })
    }

    /// Global sentence sequence (empty for remote models)
    pub fn sentences(&self) -> &[String] {
        match &self.authority {
            Authority::Local { sentences } => sentences,
            Authority::Remote => &[],
        }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn position(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_by_number(&self, scene_number: u32) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.scene_number == scene_number)
    }

    /// Replace the scene list with `target_scene_count` balanced chunks
    ///
    /// Each chunk is `max(3, round(remaining / remaining_scenes))` sentences.
    /// When sentences run out early fewer scenes are produced; empty scenes
    /// are never emitted. Returns the resulting scene count.
    pub fn segment(&mut self, target_scene_count: usize) -> usize {
        let total = self.sentences().len();
        let target = target_scene_count.max(1);
        self.scenes.clear();

        let mut cursor = 0usize;
        for i in 0..target {
            if cursor >= total {
                break;
            }
            let remaining = total - cursor;
            let remaining_scenes = target - i;
            let balanced = (remaining as f64 / remaining_scenes as f64).round() as usize;
            let chunk = balanced.max(MIN_CHUNK_SENTENCES);
            let end = (cursor + chunk - 1).min(total - 1);

            let id = self.ids.issue();
            self.scenes.push(Scene {
                id,
                scene_number: 0,
                title: String::new(),
                text: String::new(),
                status: SceneStatus::Pending,
                range: Some(SentenceRange::new(cursor, end)),
                sentence_count: None,
            });
            cursor = end + 1;
        }

        self.renumber();
        debug!(
            sentences = total,
            target = target_scene_count,
            scenes = self.scenes.len(),
            "Segmented story"
        );
        self.scenes.len()
    }

    /// Replace the scene list with scenes loaded from the scene splitter
    pub fn load_remote(&mut self, remote: Vec<RemoteScene>) {
        self.authority = Authority::Remote;
        self.scenes = remote
            .into_iter()
            .map(|r| Scene {
                id: self.ids.issue(),
                scene_number: r.scene_number,
                title: Scene::title_for(r.scene_number),
                text: r.text,
                status: SceneStatus::Pending,
                range: None,
                sentence_count: Some(r.sentence_count),
            })
            .collect();
        self.scenes.sort_by_key(|s| s.scene_number);
        self.renumber();
    }

    /// Drop every scene (new document, navigation away)
    pub fn reset(&mut self) {
        self.scenes.clear();
    }

    /// Move one edge of a scene by one sentence, resizing the neighbor
    ///
    /// The first scene's start and the last scene's end are pinned to the
    /// document edges, and neither the scene nor its neighbor drops below
    /// two sentences.
    pub fn adjust_boundary(&mut self, id: SceneId, edge: RangeEdge, shift: Shift) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let Some(range) = self.scenes[idx].range else {
            return false;
        };
        let prev = idx
            .checked_sub(1)
            .and_then(|p| self.scenes.get(p))
            .and_then(|s| s.range);
        let next = self.scenes.get(idx + 1).and_then(|s| s.range);

        let changed = match (edge, shift) {
            (RangeEdge::Start, Shift::Decrease) => match prev {
                Some(p) if range.start > p.start + 2 => {
                    self.set_bounds(idx, range.start - 1, range.end);
                    self.set_bounds(idx - 1, p.start, p.end - 1);
                    true
                }
                _ => false,
            },
            (RangeEdge::Start, Shift::Increase) => match prev {
                Some(p) if range.start + 1 < range.end => {
                    self.set_bounds(idx, range.start + 1, range.end);
                    self.set_bounds(idx - 1, p.start, p.end + 1);
                    true
                }
                _ => false,
            },
            (RangeEdge::End, Shift::Decrease) => match next {
                Some(n) if range.end > range.start + 1 => {
                    self.set_bounds(idx, range.start, range.end - 1);
                    self.set_bounds(idx + 1, n.start - 1, n.end);
                    true
                }
                _ => false,
            },
            (RangeEdge::End, Shift::Increase) => match next {
                Some(n) if range.end + 2 < n.end => {
                    self.set_bounds(idx, range.start, range.end + 1);
                    self.set_bounds(idx + 1, n.start + 1, n.end);
                    true
                }
                _ => false,
            },
        };

        if changed {
            self.renumber();
            debug!(scene_id = %id, ?edge, ?shift, "Adjusted scene boundary");
        }
        changed
    }

    /// Resize a scene directly, clamping to what the neighbors allow
    ///
    /// A moved start is clamped to `[prev.start + 2, end - 1]` and a moved
    /// end to `[start + 1, next.end - 2]` so the neighbor giving up
    /// sentences keeps two; neighbors take the complementary edge. An edge
    /// passed in unchanged is never moved, even if its neighbor is already
    /// below the minimum.
    pub fn set_range(&mut self, id: SceneId, new_start: usize, new_end: usize) -> bool {
        let total = self.sentences().len();
        let Some(idx) = self.position(id) else {
            return false;
        };
        let Some(current) = self.scenes[idx].range else {
            return false;
        };
        if total == 0 {
            return false;
        }
        let prev = idx
            .checked_sub(1)
            .and_then(|p| self.scenes.get(p))
            .and_then(|s| s.range);
        let next = self.scenes.get(idx + 1).and_then(|s| s.range);

        let min_start = prev.map_or(0, |p| p.start + MIN_SCENE_SENTENCES);
        let max_end = next.map_or(total - 1, |n| n.end.saturating_sub(MIN_SCENE_SENTENCES));
        // outer edges are pinned
        let start_fixed = prev.is_none() || new_start == current.start;
        let end_fixed = next.is_none() || new_end == current.end;

        let (start, end) = match (start_fixed, end_fixed) {
            (true, true) => return false,
            (true, false) => {
                if max_end <= current.start {
                    return false;
                }
                (current.start, new_end.clamp(current.start + 1, max_end))
            }
            (false, true) => {
                if current.end <= min_start {
                    return false;
                }
                (new_start.clamp(min_start, current.end - 1), current.end)
            }
            (false, false) => {
                if max_end < min_start + 1 {
                    return false;
                }
                let start = new_start.clamp(min_start, max_end - 1);
                (start, new_end.clamp(start + 1, max_end))
            }
        };
        if start == current.start && end == current.end {
            return false;
        }

        self.set_bounds(idx, start, end);
        if let Some(p) = prev {
            self.set_bounds(idx - 1, p.start, start - 1);
        }
        if let Some(n) = next {
            self.set_bounds(idx + 1, end + 1, n.end);
        }
        self.renumber();
        debug!(scene_id = %id, start, end, "Set scene range");
        true
    }

    /// Split a scene before `at`; returns the id of the new right half
    ///
    /// Valid only for `start < at <= end`. The left half keeps identity and
    /// status, the right half is pending.
    pub fn split(&mut self, id: SceneId, at: usize) -> Option<SceneId> {
        let idx = self.position(id)?;
        let range = self.scenes[idx].range?;
        if at <= range.start || at > range.end {
            return None;
        }

        let right_id = self.ids.issue();
        let mut right = self.scenes[idx].clone();
        right.id = right_id;
        right.status = SceneStatus::Pending;
        right.range = Some(SentenceRange::new(at, range.end));

        self.set_bounds(idx, range.start, at - 1);
        self.scenes.insert(idx + 1, right);
        self.renumber();
        debug!(scene_id = %id, at, new_scene_id = %right_id, "Split scene");
        Some(right_id)
    }

    /// Merge a scene with its neighbor into a new pending scene
    pub fn merge_with_neighbor(&mut self, id: SceneId, direction: Direction) -> Option<SceneId> {
        let idx = self.position(id)?;
        let other_idx = match direction {
            Direction::Prev => idx.checked_sub(1)?,
            Direction::Next => idx + 1,
        };
        let source = self.scenes[idx].range?;
        let other = self.scenes.get(other_idx)?.range?;

        let lower = idx.min(other_idx);
        let merged_id = self.ids.issue();
        let mut merged = self.scenes[idx].clone();
        merged.id = merged_id;
        merged.status = SceneStatus::Pending;
        merged.range = Some(SentenceRange::new(
            source.start.min(other.start),
            source.end.max(other.end),
        ));

        self.scenes.splice(lower..lower + 2, std::iter::once(merged));
        self.renumber();
        debug!(scene_id = %id, ?direction, new_scene_id = %merged_id, "Merged scenes");
        Some(merged_id)
    }

    /// Set a scene's status; returns the previous one
    pub fn set_status(&mut self, id: SceneId, status: SceneStatus) -> Option<SceneStatus> {
        let scene = self.scenes.iter_mut().find(|s| s.id == id)?;
        Some(std::mem::replace(&mut scene.status, status))
    }

    /// Toggle approval; only pending and approved scenes change
    pub fn approve(&mut self, id: SceneId, approved: bool) -> bool {
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let target = if approved {
            SceneStatus::Approved
        } else {
            SceneStatus::Pending
        };
        match scene.status {
            SceneStatus::Pending | SceneStatus::Approved if scene.status != target => {
                scene.status = target;
                true
            }
            _ => false,
        }
    }

    /// Replace a scene's text by number (server-authoritative scenes)
    pub fn set_text(&mut self, scene_number: u32, text: String) -> bool {
        match self.scenes.iter_mut().find(|s| s.scene_number == scene_number) {
            Some(scene) => {
                scene.text = text;
                true
            }
            None => false,
        }
    }

    /// Check the local partition invariant
    ///
    /// Remote models always pass: their ranges are owned by the scene splitter.
    pub fn check_partition(&self) -> bool {
        let total = match &self.authority {
            Authority::Local { sentences } => sentences.len(),
            Authority::Remote => return true,
        };
        if self.scenes.is_empty() {
            return true;
        }

        let mut expected_start = 0usize;
        for (i, scene) in self.scenes.iter().enumerate() {
            let Some(range) = scene.range else {
                return false;
            };
            if range.start != expected_start || range.end < range.start {
                return false;
            }
            if scene.scene_number as usize != i + 1 {
                return false;
            }
            expected_start = range.end + 1;
        }
        expected_start == total
    }

    fn set_bounds(&mut self, idx: usize, start: usize, end: usize) {
        if let Some(scene) = self.scenes.get_mut(idx) {
            scene.range = Some(SentenceRange::new(start, end));
        }
    }

    fn renumber(&mut self) {
        let sentences = match &self.authority {
            Authority::Local { sentences } => Some(sentences),
            Authority::Remote => None,
        };
        for (i, scene) in self.scenes.iter_mut().enumerate() {
            let number = (i + 1) as u32;
            scene.scene_number = number;
            scene.title = Scene::title_for(number);
            if let (Some(sentences), Some(range)) = (sentences, scene.range) {
                scene.text = sentences[range.start..=range.end].join(" ");
            }
        }
    }
}
