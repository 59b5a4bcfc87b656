//! Shared scene board
//!
//! The segmentation model and the illustration map are the only state that
//! generation and polling workers touch. Both live behind one async lock; a
//! worker holds it only for single-field updates (one status, one
//! illustration entry), never across latency or network waits. Readers may
//! observe a batch half-way through.

use crate::models::{Illustration, Scene, SceneId, SceneStatus};
use crate::services::segmentation::SegmentationModel;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use storyboard_common::events::{EventBus, StoryboardEvent};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// State guarded by the board lock
#[derive(Debug)]
pub struct BoardState {
    pub model: SegmentationModel,
    pub illustrations: HashMap<SceneId, Illustration>,
    /// True while a direct generation batch runs
    pub generating_all: bool,
}

impl BoardState {
    /// Drop illustrations whose scene no longer exists
    pub fn prune_illustrations(&mut self) {
        let model = &self.model;
        self.illustrations
            .retain(|id, _| model.scene(*id).is_some());
    }
}

/// Cheaply clonable handle to the scene board
#[derive(Clone)]
pub struct SceneBoard {
    state: Arc<RwLock<BoardState>>,
    events: EventBus,
}

impl SceneBoard {
    pub fn new(model: SegmentationModel, events: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(BoardState {
                model,
                illustrations: HashMap::new(),
                generating_all: false,
            })),
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.state.write().await
    }

    /// Copy of the current scene list
    pub async fn scenes(&self) -> Vec<Scene> {
        self.state.read().await.model.scenes().to_vec()
    }

    pub async fn illustration(&self, id: SceneId) -> Option<Illustration> {
        self.state.read().await.illustrations.get(&id).cloned()
    }

    pub async fn is_generating_all(&self) -> bool {
        self.state.read().await.generating_all
    }

    /// Set a scene's status and announce the change
    ///
    /// Returns the previous status, or `None` if the scene no longer exists.
    pub async fn transition(&self, id: SceneId, status: SceneStatus) -> Option<SceneStatus> {
        let (old, scene_number) = {
            let mut state = self.state.write().await;
            let old = state.model.set_status(id, status)?;
            let scene_number = state.model.scene(id).map(|s| s.scene_number)?;
            (old, scene_number)
        };

        if old != status {
            trace!(scene_id = %id, scene_number, old = %old, new = %status, "Scene status changed");
            self.events.emit_lossy(StoryboardEvent::SceneStatusChanged {
                scene_id: id.0,
                scene_number,
                old_status: old,
                new_status: status,
                timestamp: Utc::now(),
            });
        }
        Some(old)
    }

    /// Approve or un-approve a scene still under review
    pub async fn approve(&self, id: SceneId, approved: bool) -> bool {
        let status = {
            let state = self.state.read().await;
            match state.model.scene(id) {
                Some(scene) => scene.status,
                None => return false,
            }
        };
        let target = if approved {
            SceneStatus::Approved
        } else {
            SceneStatus::Pending
        };
        let under_review = matches!(status, SceneStatus::Pending | SceneStatus::Approved);
        if !under_review || status == target {
            return false;
        }
        self.transition(id, target).await.is_some()
    }

    /// Insert or replace the illustration of a scene
    pub async fn put_illustration(&self, illustration: Illustration) {
        let scene_id = illustration.scene_id;
        let image_url = illustration.image_url.clone();
        self.state
            .write()
            .await
            .illustrations
            .insert(scene_id, illustration);

        self.events.emit_lossy(StoryboardEvent::IllustrationUpdated {
            scene_id: scene_id.0,
            image_url,
            timestamp: Utc::now(),
        });
    }

    /// Announce that the scene list was replaced
    pub(crate) fn announce_loaded(&self, job_id: Option<uuid::Uuid>, scene_count: usize) {
        self.events.emit_lossy(StoryboardEvent::ScenesLoaded {
            job_id,
            scene_count,
            timestamp: Utc::now(),
        });
    }

    pub(crate) async fn set_generating_all(&self, value: bool) {
        self.state.write().await.generating_all = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> SceneBoard {
        let sentences = (0..6).map(|i| format!("S{}.", i)).collect();
        let mut model = SegmentationModel::local(sentences);
        model.segment(2);
        SceneBoard::new(model, EventBus::new(16))
    }

    #[tokio::test]
    async fn test_transition_emits_only_on_change() {
        let board = board();
        let mut rx = board.events().subscribe();
        let id = board.scenes().await[0].id;

        assert_eq!(board.transition(id, SceneStatus::Approved).await, Some(SceneStatus::Pending));
        assert!(matches!(
            rx.try_recv(),
            Ok(StoryboardEvent::SceneStatusChanged { new_status: SceneStatus::Approved, .. })
        ));

        board.transition(id, SceneStatus::Approved).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(board.transition(SceneId(999), SceneStatus::Ready).await, None);
    }

    #[tokio::test]
    async fn test_put_illustration_overwrites() {
        let board = board();
        let id = board.scenes().await[1].id;
        let make = |url: &str| Illustration {
            id: format!("illustration-{}", id),
            scene_id: id,
            image_url: url.to_string(),
            created_at: Utc::now(),
            prompt_preview: None,
            source_image_id: None,
        };

        board.put_illustration(make("a")).await;
        board.put_illustration(make("b")).await;

        assert_eq!(board.illustration(id).await.unwrap().image_url, "b");
        assert_eq!(board.read().await.illustrations.len(), 1);
    }
}
