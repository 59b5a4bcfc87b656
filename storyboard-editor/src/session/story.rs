//! Self-contained story session
//!
//! A plain-text story is split into sentences once; scenes are ranges over
//! that sequence and illustrations are generated locally.

use crate::models::{Illustration, SceneId, SceneStatus};
use crate::projection::{
    calculate_pagination, can_generate_images, project, ScenePage, SceneStats, ViewQuery,
};
use crate::services::{
    Direction, FailurePolicy, GenerationController, GenerationSummary, LatencyModel, RangeEdge,
    SceneBoard, SegmentationModel, SentenceSplitter, Shift,
};
use std::sync::Arc;
use storyboard_common::config::GenerationConfig;
use storyboard_common::events::EventBus;
use tracing::info;

pub struct StorySession {
    board: SceneBoard,
    generator: GenerationController,
    query: ViewQuery,
}

impl StorySession {
    /// Session over an already split sentence sequence
    pub fn new(sentences: Vec<String>, events: EventBus, generation: &GenerationConfig) -> Self {
        let board = SceneBoard::new(SegmentationModel::local(sentences), events);
        let generator = GenerationController::from_config(board.clone(), generation);
        Self {
            board,
            generator,
            query: ViewQuery::default(),
        }
    }

    /// Session over `text`, split with `splitter`
    pub fn from_text(
        text: &str,
        splitter: &dyn SentenceSplitter,
        events: EventBus,
        generation: &GenerationConfig,
    ) -> Self {
        Self::new(splitter.split(text), events, generation)
    }

    /// Swap the failure and latency policies
    pub fn with_policies(
        mut self,
        failure: Arc<dyn FailurePolicy>,
        latency: Arc<dyn LatencyModel>,
    ) -> Self {
        self.generator = GenerationController::new(self.board.clone(), failure, latency);
        self
    }

    pub fn board(&self) -> &SceneBoard {
        &self.board
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut ViewQuery {
        &mut self.query
    }

    /// Partition the story into `target_scene_count` scenes
    ///
    /// Replaces every scene, drops illustrations and returns to page 1.
    pub async fn segment(&mut self, target_scene_count: usize) -> usize {
        let count = {
            let mut state = self.board.write().await;
            state.illustrations.clear();
            state.model.segment(target_scene_count)
        };
        self.query.page = 1;
        info!(scenes = count, "Story segmented");
        self.board.announce_loaded(None, count);
        count
    }

    pub async fn approve(&self, id: SceneId, approved: bool) -> bool {
        self.board.approve(id, approved).await
    }

    /// Approve or un-approve every reviewable scene on the current page
    pub async fn approve_page(&self, approved: bool) -> usize {
        let ids: Vec<SceneId> = {
            let state = self.board.read().await;
            project(state.model.scenes(), &self.query)
                .scenes
                .iter()
                .filter(|s| matches!(s.status, SceneStatus::Pending | SceneStatus::Approved))
                .map(|s| s.id)
                .collect()
        };

        let mut changed = 0;
        for id in ids {
            if self.board.approve(id, approved).await {
                changed += 1;
            }
        }
        changed
    }

    pub async fn adjust_boundary(&self, id: SceneId, edge: RangeEdge, shift: Shift) -> bool {
        self.board
            .write()
            .await
            .model
            .adjust_boundary(id, edge, shift)
    }

    pub async fn set_range(&self, id: SceneId, start: usize, end: usize) -> bool {
        self.board.write().await.model.set_range(id, start, end)
    }

    pub async fn split(&self, id: SceneId, at: usize) -> Option<SceneId> {
        self.board.write().await.model.split(id, at)
    }

    pub async fn merge_with_neighbor(&self, id: SceneId, direction: Direction) -> Option<SceneId> {
        let mut state = self.board.write().await;
        let merged = state.model.merge_with_neighbor(id, direction)?;
        state.prune_illustrations();
        Some(merged)
    }

    pub async fn generate_one(&self, id: SceneId) -> Option<SceneStatus> {
        self.generator.generate_one(id).await
    }

    pub async fn generate_approved(&self, max_parallel: usize) -> Option<GenerationSummary> {
        self.generator.generate_approved(max_parallel).await
    }

    /// Move to a page, clamped to the current result set
    pub async fn set_page(&mut self, page: usize) -> usize {
        let total = {
            let state = self.board.read().await;
            project(state.model.scenes(), &self.query).total_filtered
        };
        self.query.page = calculate_pagination(total, page, self.query.page_size).page;
        self.query.page
    }

    pub async fn page(&self) -> ScenePage {
        let state = self.board.read().await;
        project(state.model.scenes(), &self.query).to_page()
    }

    pub async fn stats(&self) -> SceneStats {
        SceneStats::from_scenes(self.board.read().await.model.scenes())
    }

    pub async fn can_generate_images(&self) -> bool {
        can_generate_images(self.board.read().await.model.scenes())
    }

    pub async fn is_generating_all(&self) -> bool {
        self.board.is_generating_all().await
    }

    pub async fn illustration(&self, id: SceneId) -> Option<Illustration> {
        self.board.illustration(id).await
    }
}
