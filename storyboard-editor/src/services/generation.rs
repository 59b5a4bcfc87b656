//! Direct illustration generation for self-contained stories
//!
//! Generation is simulated: each scene waits for a latency drawn from a
//! [`LatencyModel`], then either fails (per the [`FailurePolicy`]) or gets a
//! placeholder illustration. Batches run on the strided worker pool.

use crate::models::{Illustration, SceneId, SceneStatus};
use crate::projection::can_generate_images;
use crate::services::board::SceneBoard;
use crate::services::worker_pool::{run_strided, strided_assignments};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use storyboard_common::config::GenerationConfig;
use storyboard_common::events::StoryboardEvent;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Decides which scenes fail to generate
pub trait FailurePolicy: Send + Sync {
    fn fails(&self, scene_number: u32) -> bool;
}

/// Every scene whose number is a multiple of N fails (0 never fails)
#[derive(Debug, Clone, Copy)]
pub struct EveryNthSceneFails(pub u32);

impl FailurePolicy for EveryNthSceneFails {
    fn fails(&self, scene_number: u32) -> bool {
        self.0 != 0 && scene_number % self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFails;

impl FailurePolicy for NeverFails {
    fn fails(&self, _scene_number: u32) -> bool {
        false
    }
}

/// Simulated per-scene generation latency
pub trait LatencyModel: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniformly random latency in `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct UniformLatency {
    pub min: Duration,
    pub max: Duration,
}

impl LatencyModel for UniformLatency {
    fn next_delay(&self) -> Duration {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let ms = rand::thread_rng().gen_range(lo.as_millis() as u64..=hi.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedLatency(pub Duration);

impl LatencyModel for FixedLatency {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// Outcome of one `generate_approved` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub queued: usize,
    pub workers: usize,
    pub ready: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Drives simulated generation over the scene board
pub struct GenerationController {
    board: SceneBoard,
    failure: Arc<dyn FailurePolicy>,
    latency: Arc<dyn LatencyModel>,
}

impl GenerationController {
    pub fn new(
        board: SceneBoard,
        failure: Arc<dyn FailurePolicy>,
        latency: Arc<dyn LatencyModel>,
    ) -> Self {
        Self {
            board,
            failure,
            latency,
        }
    }

    /// Controller with the configured latency window and failure rule
    pub fn from_config(board: SceneBoard, config: &GenerationConfig) -> Self {
        Self::new(
            board,
            Arc::new(EveryNthSceneFails(config.fail_every)),
            Arc::new(UniformLatency {
                min: Duration::from_millis(config.min_latency_ms),
                max: Duration::from_millis(config.max_latency_ms),
            }),
        )
    }

    /// Generate one scene: generating, wait, then ready or error
    ///
    /// Returns the final status, or `None` if the scene does not exist (or
    /// was removed while generating). Callers must not run two generations
    /// for the same scene concurrently.
    pub async fn generate_one(&self, id: SceneId) -> Option<SceneStatus> {
        self.board.transition(id, SceneStatus::Generating).await?;

        let delay = self.latency.next_delay();
        debug!(scene_id = %id, delay_ms = delay.as_millis() as u64, "Generating illustration");
        tokio::time::sleep(delay).await;

        let (scene_number, title) = {
            let state = self.board.read().await;
            let scene = state.model.scene(id)?;
            (scene.scene_number, scene.title.clone())
        };

        if self.failure.fails(scene_number) {
            warn!(scene_id = %id, scene_number, "Illustration generation failed");
            self.board.transition(id, SceneStatus::Error).await?;
            return Some(SceneStatus::Error);
        }

        self.board
            .put_illustration(placeholder_illustration(id, scene_number, &title))
            .await;
        self.board.transition(id, SceneStatus::Ready).await?;
        Some(SceneStatus::Ready)
    }

    /// Generate every approved or failed scene with bounded parallelism
    ///
    /// No-op (returns `None`) while any scene is still pending or when there
    /// is nothing to generate.
    pub async fn generate_approved(&self, max_parallel: usize) -> Option<GenerationSummary> {
        let queue: Vec<SceneId> = {
            let state = self.board.read().await;
            let scenes = state.model.scenes();
            if !can_generate_images(scenes) {
                debug!("Generation skipped: scenes still pending review");
                return None;
            }
            scenes
                .iter()
                .filter(|s| matches!(s.status, SceneStatus::Approved | SceneStatus::Error))
                .map(|s| s.id)
                .collect()
        };
        if queue.is_empty() {
            return None;
        }

        let queued = queue.len();
        let workers = strided_assignments(queued, max_parallel).len();
        let started = Instant::now();
        self.board.set_generating_all(true).await;
        info!(queued, workers, "Generation batch started");
        self.board
            .events()
            .emit_lossy(StoryboardEvent::GenerationBatchStarted {
                queued,
                workers,
                timestamp: Utc::now(),
            });

        let outcomes = run_strided(queue, max_parallel, move |_, id| self.generate_one(id)).await;

        self.board.set_generating_all(false).await;
        let ready = outcomes
            .iter()
            .filter(|o| **o == Some(SceneStatus::Ready))
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| **o == Some(SceneStatus::Error))
            .count();
        let duration = started.elapsed();

        info!(
            ready,
            failed,
            duration_ms = duration.as_millis() as u64,
            "Generation batch completed"
        );
        self.board
            .events()
            .emit_lossy(StoryboardEvent::GenerationBatchCompleted {
                ready,
                failed,
                duration_ms: duration.as_millis() as u64,
                timestamp: Utc::now(),
            });

        Some(GenerationSummary {
            queued,
            workers,
            ready,
            failed,
            duration,
        })
    }
}

/// Mock illustration: an SVG data URI showing the scene title
pub fn placeholder_illustration(id: SceneId, scene_number: u32, title: &str) -> Illustration {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='960' height='540'>\
         <rect width='100%' height='100%' fill='%233b82f6'/>\
         <text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle' \
         fill='white' font-size='42' font-family='Arial'>{}</text></svg>",
        urlencoding::encode(title)
    );

    Illustration {
        id: format!("illustration-{}", id),
        scene_id: id,
        image_url: format!("data:image/svg+xml;utf8,{}", svg),
        created_at: Utc::now(),
        prompt_preview: Some(format!(
            "cinematic digital painting, scene {}, dramatic lighting, high detail",
            scene_number
        )),
        source_image_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_nth_scene_fails() {
        let policy = EveryNthSceneFails(7);
        assert!(policy.fails(7));
        assert!(policy.fails(14));
        assert!(!policy.fails(6));
        assert!(!EveryNthSceneFails(0).fails(7));
        assert!(!NeverFails.fails(7));
    }

    #[test]
    fn test_uniform_latency_bounds() {
        let latency = UniformLatency {
            min: Duration::from_millis(3600),
            max: Duration::from_millis(1200),
        };
        for _ in 0..50 {
            let d = latency.next_delay();
            assert!(d >= Duration::from_millis(1200) && d <= Duration::from_millis(3600));
        }
    }

    #[test]
    fn test_placeholder_illustration() {
        let ill = placeholder_illustration(SceneId(4), 3, "Scene 3");
        assert_eq!(ill.id, "illustration-scene-4");
        assert!(ill.image_url.starts_with("data:image/svg+xml;utf8,"));
        assert!(ill.image_url.contains("Scene%203"));

        let escaped = placeholder_illustration(SceneId(5), 4, "Dawn & <Dusk>");
        assert!(escaped.image_url.contains(">Dawn%20%26%20%3CDusk%3E</text>"));
        assert_eq!(
            ill.prompt_preview.as_deref(),
            Some("cinematic digital painting, scene 3, dramatic lighting, high detail")
        );
    }
}
