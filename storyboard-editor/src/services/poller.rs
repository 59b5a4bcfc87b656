//! Remote image polling
//!
//! `start_polling` runs one pass immediately and then one per interval
//! until every scene is ready or polling is stopped. Passes are single
//! flight: a tick that finds a pass still running is dropped, not queued.
//! Stopping cancels the schedule only; fetches already in flight finish,
//! but their results are discarded and they no longer hold the in-flight
//! slot.

use crate::client::ImageGeneratorApi;
use crate::models::{GeneratedImage, Illustration, SceneId, SceneStatus};
use crate::services::board::SceneBoard;
use crate::services::worker_pool::run_strided;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storyboard_common::events::{PollStopReason, StoryboardEvent};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default cap on concurrent image fetches within one pass
pub const DEFAULT_POLL_CONCURRENCY: usize = 4;

/// Result of one poll pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another pass was in flight; nothing was fetched
    Skipped,
    /// Polling was stopped or restarted while this pass ran; results dropped
    Superseded,
    Completed {
        /// Fetches attempted
        fetched: usize,
        /// Scenes that became ready
        updated: usize,
        /// Every scene is ready after this pass
        all_ready: bool,
    },
}

/// Handle to a running poll schedule
pub struct PollHandle {
    story_id: Uuid,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn story_id(&self) -> Uuid {
        self.story_id
    }

    /// Stop scheduling further passes
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the schedule ends (all ready, cancelled or superseded)
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(story_id = %self.story_id, error = %e, "Poll schedule task failed");
        }
    }
}

struct ActivePoll {
    poll_id: u64,
    story_id: Uuid,
    token: CancellationToken,
}

struct PollerInner {
    board: SceneBoard,
    api: Arc<dyn ImageGeneratorApi>,
    concurrency: usize,
    /// Bumped by every stop; passes from an older epoch are stale
    epoch: AtomicU64,
    /// Epoch of the pass holding the slot, 0 when free
    in_flight: AtomicU64,
    next_poll_id: AtomicU64,
    active: Mutex<Option<ActivePoll>>,
}

/// Polls the image generator and writes results onto the scene board
#[derive(Clone)]
pub struct ImagePoller {
    inner: Arc<PollerInner>,
}

/// Frees the in-flight slot when a pass ends, unless a stop already
/// handed the slot on
struct InFlightGuard<'a> {
    slot: &'a AtomicU64,
    epoch: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.epoch, 0, Ordering::AcqRel, Ordering::Acquire);
    }
}

impl ImagePoller {
    pub fn new(board: SceneBoard, api: Arc<dyn ImageGeneratorApi>, concurrency: usize) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                board,
                api,
                concurrency: concurrency.max(1),
                epoch: AtomicU64::new(1),
                in_flight: AtomicU64::new(0),
                next_poll_id: AtomicU64::new(1),
                active: Mutex::new(None),
            }),
        }
    }

    pub fn board(&self) -> &SceneBoard {
        &self.inner.board
    }

    /// True while a pass is running
    pub fn is_pass_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire) != 0
    }

    /// Story currently scheduled for polling
    pub async fn active_story(&self) -> Option<Uuid> {
        self.inner
            .active
            .lock()
            .await
            .as_ref()
            .filter(|a| !a.token.is_cancelled())
            .map(|a| a.story_id)
    }

    /// Start polling a story, replacing any running schedule
    ///
    /// Scenes that are neither ready nor in error are marked generating.
    pub async fn start_polling(&self, story_id: Uuid, interval: Duration) -> PollHandle {
        self.stop_with(PollStopReason::Superseded).await;

        let waiting: Vec<SceneId> = self
            .inner
            .board
            .scenes()
            .await
            .into_iter()
            .filter(|s| !matches!(s.status, SceneStatus::Ready | SceneStatus::Error))
            .map(|s| s.id)
            .collect();
        for id in waiting {
            self.inner.board.transition(id, SceneStatus::Generating).await;
        }

        let poll_id = self.inner.next_poll_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *self.inner.active.lock().await = Some(ActivePoll {
            poll_id,
            story_id,
            token: token.clone(),
        });

        let interval_ms = interval.as_millis() as u64;
        info!(%story_id, interval_ms, "Image polling started");
        self.inner
            .board
            .events()
            .emit_lossy(StoryboardEvent::PollingStarted {
                story_id,
                interval_ms,
                timestamp: Utc::now(),
            });

        let poller = self.clone();
        let schedule_token = token.clone();
        let period = interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = schedule_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let pass_poller = poller.clone();
                        tokio::spawn(async move {
                            let outcome = pass_poller.poll_pass(story_id).await;
                            if let PollOutcome::Completed { all_ready: true, .. } = outcome {
                                pass_poller.finish(poll_id).await;
                            }
                        });
                    }
                }
            }
            debug!(%story_id, "Poll schedule ended");
        });

        PollHandle {
            story_id,
            token,
            task,
        }
    }

    /// Cancel the schedule, release the in-flight slot and forget the story
    ///
    /// A pass still running from before the stop writes nothing.
    pub async fn stop_polling(&self) {
        self.stop_with(PollStopReason::Cancelled).await;
    }

    /// Run one poll pass unless another is in flight
    ///
    /// Fetches every scene that is not ready, at most `concurrency` at a
    /// time. A failed fetch is logged and leaves the scene untouched for the
    /// next pass. A pass overtaken by a stop or restart drops its results
    /// and returns [`PollOutcome::Superseded`].
    pub async fn poll_pass(&self, story_id: Uuid) -> PollOutcome {
        let epoch = self.inner.epoch.load(Ordering::Acquire);
        if self
            .inner
            .in_flight
            .compare_exchange(0, epoch, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(%story_id, "Poll pass skipped: previous pass still in flight");
            return PollOutcome::Skipped;
        }
        let _guard = InFlightGuard {
            slot: &self.inner.in_flight,
            epoch,
        };
        if !self.is_current(epoch) {
            return PollOutcome::Superseded;
        }

        let waiting: Vec<(SceneId, u32)> = self
            .inner
            .board
            .scenes()
            .await
            .into_iter()
            .filter(|s| s.status != SceneStatus::Ready)
            .map(|s| (s.id, s.scene_number))
            .collect();
        let fetched = waiting.len();

        let api = &self.inner.api;
        let results = run_strided(
            waiting,
            self.inner.concurrency,
            move |_, (id, number)| async move {
                (id, number, api.fetch_generated_image(story_id, number).await)
            },
        )
        .await;

        let mut updated = 0;
        for (id, scene_number, result) in results {
            if !self.is_current(epoch) {
                debug!(%story_id, "Poll pass superseded; dropping results");
                return PollOutcome::Superseded;
            }
            match result {
                Ok(Some(image)) if !image.url.is_empty() => {
                    if self.apply_image(id, image).await {
                        updated += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        %story_id,
                        scene_number,
                        error = %e,
                        "Image fetch failed; will retry next pass"
                    );
                }
            }
        }

        if !self.is_current(epoch) {
            return PollOutcome::Superseded;
        }
        let (ready, total) = {
            let state = self.inner.board.read().await;
            let scenes = state.model.scenes();
            let ready = scenes
                .iter()
                .filter(|s| s.status == SceneStatus::Ready)
                .count();
            (ready, scenes.len())
        };
        let all_ready = ready == total;

        debug!(%story_id, fetched, updated, ready, total, "Poll pass completed");
        self.inner
            .board
            .events()
            .emit_lossy(StoryboardEvent::PollPassCompleted {
                story_id,
                fetched,
                updated,
                ready,
                total,
                timestamp: Utc::now(),
            });

        PollOutcome::Completed {
            fetched,
            updated,
            all_ready,
        }
    }

    /// Write the image if it changed and mark the scene ready
    ///
    /// Returns whether the scene became ready.
    async fn apply_image(&self, id: SceneId, image: GeneratedImage) -> bool {
        let board = &self.inner.board;
        let changed = match board.read().await.illustrations.get(&id) {
            Some(existing) => {
                existing.source_image_id.as_deref() != Some(image.image_id.as_str())
                    || existing.image_url != image.url
            }
            None => true,
        };

        if changed {
            board
                .put_illustration(Illustration {
                    id: format!("illustration-{}", id),
                    scene_id: id,
                    image_url: image.url,
                    created_at: image.created_at.unwrap_or_else(Utc::now),
                    prompt_preview: image.prompt_text,
                    source_image_id: Some(image.image_id),
                })
                .await;
        }

        matches!(
            board.transition(id, SceneStatus::Ready).await,
            Some(old) if old != SceneStatus::Ready
        )
    }

    async fn finish(&self, poll_id: u64) {
        let finished = {
            let mut active = self.inner.active.lock().await;
            match active.as_ref() {
                Some(a) if a.poll_id == poll_id => active.take(),
                _ => None,
            }
        };

        if let Some(poll) = finished {
            poll.token.cancel();
            info!(story_id = %poll.story_id, "Image polling finished: all scenes ready");
            self.inner
                .board
                .events()
                .emit_lossy(StoryboardEvent::PollingStopped {
                    story_id: poll.story_id,
                    reason: PollStopReason::AllReady,
                    timestamp: Utc::now(),
                });
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::Acquire) == epoch
    }

    async fn stop_with(&self, reason: PollStopReason) {
        let previous = self.inner.active.lock().await.take();
        let current = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        // hand the slot on; a pass from the new epoch keeps it
        let _ = self
            .inner
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held != 0 && held < current).then_some(0)
            });

        if let Some(poll) = previous {
            poll.token.cancel();
            info!(story_id = %poll.story_id, ?reason, "Image polling stopped");
            self.inner
                .board
                .events()
                .emit_lossy(StoryboardEvent::PollingStopped {
                    story_id: poll.story_id,
                    reason,
                    timestamp: Utc::now(),
                });
        }
    }
}
