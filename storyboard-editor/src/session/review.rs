//! Scene review session for a scene splitter processing job
//!
//! The scene splitter owns the scenes. The session caches sentence lists,
//! buffers edited text until it is saved, and batches merge requests.

use crate::client::SceneSplitterApi;
use crate::error::{EditorError, EditorResult};
use crate::models::{Scene, ScenePatch};
use crate::projection::{
    calculate_pagination, project, MergeSummary, ScenePage, SceneStats, ViewQuery,
};
use crate::services::{
    Direction, Edge, MergeQueue, SceneBoard, SegmentationModel, SentenceSplitter, SentenceStore,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use storyboard_common::events::{EventBus, StoryboardEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ReviewSession {
    api: Arc<dyn SceneSplitterApi>,
    board: SceneBoard,
    job_id: Option<Uuid>,
    sentences: SentenceStore,
    dirty_texts: BTreeMap<u32, String>,
    merge_queue: MergeQueue,
    query: ViewQuery,
    loading: bool,
    last_error: Option<String>,
    segmentation_approved: bool,
}

impl ReviewSession {
    pub fn new(
        api: Arc<dyn SceneSplitterApi>,
        splitter: Arc<dyn SentenceSplitter>,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            board: SceneBoard::new(SegmentationModel::remote(), events),
            job_id: None,
            sentences: SentenceStore::new(splitter),
            dirty_texts: BTreeMap::new(),
            merge_queue: MergeQueue::new(),
            query: ViewQuery::default(),
            loading: false,
            last_error: None,
            segmentation_approved: false,
        }
    }

    /// Scene board shared with an image poller
    pub fn board(&self) -> &SceneBoard {
        &self.board
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn segmentation_approved(&self) -> bool {
        self.segmentation_approved
    }

    /// Edited scene texts not yet saved, by scene number
    pub fn dirty_texts(&self) -> &BTreeMap<u32, String> {
        &self.dirty_texts
    }

    pub fn merge_queue(&self) -> &MergeQueue {
        &self.merge_queue
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut ViewQuery {
        &mut self.query
    }

    /// Load (or reload) every scene of a job
    ///
    /// On success the scene list, sentence cache, dirty texts and merge queue
    /// are all replaced. Failures are recorded on the session and returned.
    pub async fn load_scenes(&mut self, job_id: Uuid) -> EditorResult<usize> {
        self.loading = true;
        self.last_error = None;
        let result = self.api.fetch_scenes(job_id).await;
        self.loading = false;

        let remote = match result {
            Ok(remote) => remote,
            Err(e) => {
                self.record_error("load_scenes", &e);
                return Err(e);
            }
        };

        let count = {
            let mut state = self.board.write().await;
            state.model.load_remote(remote);
            state.illustrations.clear();
            state.model.len()
        };
        if self.job_id != Some(job_id) {
            self.segmentation_approved = false;
        }
        self.job_id = Some(job_id);
        self.query.page = 1;
        self.sentences.clear();
        self.dirty_texts.clear();
        self.merge_queue.clear();

        info!(%job_id, scenes = count, "Scenes loaded");
        self.board.announce_loaded(Some(job_id), count);
        Ok(count)
    }

    /// Fetch a scene's sentences from the scene splitter, replacing the cache
    pub async fn load_sentences(&mut self, scene_number: u32) -> EditorResult<Vec<String>> {
        let job_id = self.job_id.ok_or(EditorError::NoActiveJob)?;
        match self.api.fetch_sentences(job_id, scene_number).await {
            Ok(list) => {
                self.sentences.insert(scene_number, list.clone());
                Ok(list)
            }
            Err(e) => {
                self.record_error("load_sentences", &e);
                Err(e)
            }
        }
    }

    /// Cached sentences, else fetched, else split from the scene text
    ///
    /// Scenes with unsaved text are always split locally: the server list
    /// predates the edit. Unknown scene numbers yield an empty list that is
    /// not cached.
    pub async fn ensure_sentences(&mut self, scene_number: u32) -> EditorResult<Vec<String>> {
        if let Some(cached) = self.sentences.get(scene_number) {
            return Ok(cached.to_vec());
        }
        let Some(text) = self.scene_text(scene_number).await else {
            return Ok(Vec::new());
        };
        if self.job_id.is_some() && !self.dirty_texts.contains_key(&scene_number) {
            return self.load_sentences(scene_number).await;
        }
        Ok(self.sentences.derive(scene_number, &text))
    }

    /// Move sentences to a neighbor scene and resync both texts
    ///
    /// Returns `Ok(false)` for rejected moves (reverse reading order, no
    /// neighbor, nothing to move).
    pub async fn move_sentences(
        &mut self,
        scene_number: u32,
        edge: Edge,
        count: usize,
        direction: Direction,
    ) -> EditorResult<bool> {
        if matches!(
            (edge, direction),
            (Edge::Head, Direction::Next) | (Edge::Tail, Direction::Prev)
        ) || count == 0
        {
            return Ok(false);
        }
        let Some(target) = direction.neighbor_of(scene_number) else {
            return Ok(false);
        };
        if self.scene_text(target).await.is_none()
            || self.scene_text(scene_number).await.is_none()
        {
            return Ok(false);
        }

        self.ensure_sentences(scene_number).await?;
        self.ensure_sentences(target).await?;
        let Some(transfer) = self
            .sentences
            .move_sentences(scene_number, edge, count, direction)
        else {
            return Ok(false);
        };

        self.sync_text(transfer.source).await;
        self.sync_text(transfer.target).await;
        Ok(true)
    }

    /// Replace a scene's text, mark it dirty and drop its sentence cache
    pub async fn update_scene_text(&mut self, scene_number: u32, text: String) -> bool {
        let updated = self
            .board
            .write()
            .await
            .model
            .set_text(scene_number, text.clone());
        if updated {
            self.dirty_texts.insert(scene_number, text);
            self.sentences.invalidate(scene_number);
        }
        updated
    }

    /// Send every dirty text in one patch; returns how many were saved
    pub async fn save_all(&mut self) -> EditorResult<usize> {
        let Some(job_id) = self.job_id else {
            return Ok(0);
        };
        if self.dirty_texts.is_empty() {
            return Ok(0);
        }

        let patches: Vec<ScenePatch> = self
            .dirty_texts
            .iter()
            .map(|(n, text)| ScenePatch {
                scene_number: *n,
                scene_text: text.clone(),
            })
            .collect();

        if let Err(e) = self.api.patch_scenes(job_id, &patches).await {
            self.record_error("save_all", &e);
            return Err(e);
        }
        self.dirty_texts.clear();
        info!(%job_id, saved = patches.len(), "Scene texts saved");
        Ok(patches.len())
    }

    /// Save pending text, then approve the job's segmentation
    pub async fn approve_current_job(&mut self) -> EditorResult<()> {
        let job_id = self.job_id.ok_or(EditorError::NoActiveJob)?;
        self.save_all().await?;
        if let Err(e) = self.api.approve_job(job_id).await {
            self.record_error("approve_job", &e);
            return Err(e);
        }
        self.segmentation_approved = true;
        info!(%job_id, "Segmentation approved");
        Ok(())
    }

    /// Toggle the manual merge link between scene `link` and `link + 1`
    pub async fn toggle_merge_link(&mut self, link: u32) -> Option<bool> {
        let scene_count = self.board.read().await.model.len();
        self.merge_queue.toggle(link, scene_count)
    }

    /// Recompute automatic merge links for scenes below `threshold`
    pub async fn queue_short_scenes(&mut self, threshold: usize) -> usize {
        let counts = self.sentence_counts().await;
        let queued = self.merge_queue.queue_short_scenes(&counts, threshold);
        debug!(threshold, queued, "Short scenes queued for merging");
        queued
    }

    pub fn clear_manual_merges(&mut self) {
        self.merge_queue.clear_manual();
    }

    pub fn clear_automatic_merges(&mut self) {
        self.merge_queue.clear_automatic();
    }

    pub fn merge_summary(&self) -> MergeSummary {
        MergeSummary::from_queue(&self.merge_queue)
    }

    /// Commit queued merges and reload the job
    ///
    /// Dirty text is saved first. Groups are sent highest scene number first
    /// so earlier merges never renumber scenes of a later group. A failed
    /// group leaves the remaining groups queued. Returns the number of groups
    /// merged.
    pub async fn commit_merges(&mut self) -> EditorResult<usize> {
        let job_id = self.job_id.ok_or(EditorError::NoActiveJob)?;
        let plan = self.merge_queue.commit_plan();
        if plan.is_empty() {
            return Ok(0);
        }

        self.save_all().await?;
        for group in &plan {
            if let Err(e) = self.api.merge_scenes(job_id, group).await {
                self.record_error("merge_scenes", &e);
                return Err(e);
            }
            self.merge_queue.remove_group(group);
            debug!(%job_id, scene_numbers = ?group, "Merge group committed");
            self.board
                .events()
                .emit_lossy(StoryboardEvent::MergeGroupCommitted {
                    job_id,
                    scene_numbers: group.clone(),
                    timestamp: Utc::now(),
                });
        }

        info!(%job_id, groups = plan.len(), "Merges committed; reloading scenes");
        self.load_scenes(job_id).await?;
        Ok(plan.len())
    }

    /// Sentence count per scene: cached list length, else the server count
    pub async fn sentence_counts(&self) -> Vec<usize> {
        let state = self.board.read().await;
        state
            .model
            .scenes()
            .iter()
            .map(|s| {
                self.sentences
                    .get(s.scene_number)
                    .map_or_else(|| s.sentence_count(), <[String]>::len)
            })
            .collect()
    }

    pub async fn scenes(&self) -> Vec<Scene> {
        self.board.scenes().await
    }

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

    /// Forget the job and every cached or pending edit
    pub async fn reset(&mut self) {
        {
            let mut state = self.board.write().await;
            state.model.reset();
            state.illustrations.clear();
        }
        self.job_id = None;
        self.sentences.clear();
        self.dirty_texts.clear();
        self.merge_queue.clear();
        self.query = ViewQuery::default();
        self.last_error = None;
        self.segmentation_approved = false;
    }

    async fn scene_text(&self, scene_number: u32) -> Option<String> {
        self.board
            .read()
            .await
            .model
            .scene_by_number(scene_number)
            .map(|s| s.text.clone())
    }

    async fn sync_text(&mut self, scene_number: u32) {
        let text = self.sentences.joined(scene_number).unwrap_or_default();
        self.board
            .write()
            .await
            .model
            .set_text(scene_number, text.clone());
        self.dirty_texts.insert(scene_number, text);
    }

    fn record_error(&mut self, operation: &str, error: &EditorError) {
        warn!(operation, error = %error, "Review session operation failed");
        self.last_error = Some(error.to_string());
        self.board
            .events()
            .emit_lossy(StoryboardEvent::SessionError {
                operation: operation.to_string(),
                error: error.to_string(),
                timestamp: Utc::now(),
            });
    }
}
