//! Event types for the storyboard event system
//!
//! Provides shared event definitions and the EventBus used by the editor core
//! to notify presentation layers of scene, merge, generation and polling
//! changes. The core never waits on subscribers.

mod scene_types;

pub use scene_types::{PollStopReason, SceneStatus};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Storyboard event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to a presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoryboardEvent {
    /// Scene list replaced by a segmentation or load operation
    ///
    /// Triggers:
    /// - UI: Re-render scene list, reset pagination
    ScenesLoaded {
        /// Processing job the scenes belong to (None for local stories)
        job_id: Option<Uuid>,
        /// Number of scenes after the load
        scene_count: usize,
        /// When scenes were loaded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Scene status changed
    ///
    /// Triggers:
    /// - UI: Update status badge and aggregate counters
    SceneStatusChanged {
        /// Arena-issued scene id
        scene_id: u64,
        /// Current 1-based scene number
        scene_number: u32,
        /// Status before change
        old_status: SceneStatus,
        /// Status after change
        new_status: SceneStatus,
        /// When status changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Illustration for a scene created or replaced
    IllustrationUpdated {
        /// Arena-issued scene id
        scene_id: u64,
        /// Image location
        image_url: String,
        /// When illustration changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One contiguous merge group accepted by the scene splitter
    MergeGroupCommitted {
        /// Processing job
        job_id: Uuid,
        /// Consecutive scene numbers merged into the first
        scene_numbers: Vec<u32>,
        /// When the merge completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Direct generation batch started
    GenerationBatchStarted {
        /// Scenes in the work queue
        queued: usize,
        /// Workers draining the queue
        workers: usize,
        /// When batch started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Direct generation batch finished
    GenerationBatchCompleted {
        /// Scenes that ended ready
        ready: usize,
        /// Scenes that ended in error
        failed: usize,
        /// Batch duration in milliseconds
        duration_ms: u64,
        /// When batch completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote image polling started
    PollingStarted {
        /// Story being polled
        story_id: Uuid,
        /// Delay between passes
        interval_ms: u64,
        /// When polling started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote image poll pass finished
    PollPassCompleted {
        /// Story being polled
        story_id: Uuid,
        /// Fetches attempted in this pass
        fetched: usize,
        /// Scenes that became ready in this pass
        updated: usize,
        /// Scenes that are ready after this pass
        ready: usize,
        /// Total scenes
        total: usize,
        /// When the pass finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote image polling ended
    PollingStopped {
        /// Story that was polled
        story_id: Uuid,
        /// Why polling ended
        reason: PollStopReason,
        /// When polling stopped
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A session operation failed; message is also kept on the session
    ///
    /// Triggers:
    /// - UI: Show error notification
    SessionError {
        /// Operation that failed
        operation: String,
        /// Error message
        error: String,
        /// When error occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use storyboard_common::events::{EventBus, StoryboardEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(StoryboardEvent::ScenesLoaded {
///     job_id: None,
///     scene_count: 12,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(StoryboardEvent::ScenesLoaded { scene_count: 12, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoryboardEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StoryboardEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: StoryboardEvent,
    ) -> Result<usize, broadcast::error::SendError<StoryboardEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StoryboardEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(10);
        let result = bus.emit(StoryboardEvent::SessionError {
            operation: "load_scenes".to_string(),
            error: "boom".to_string(),
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_status_change() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(StoryboardEvent::SceneStatusChanged {
            scene_id: 4,
            scene_number: 2,
            old_status: SceneStatus::Approved,
            new_status: SceneStatus::Generating,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            StoryboardEvent::SceneStatusChanged { scene_id, new_status, .. } => {
                assert_eq!(scene_id, 4);
                assert_eq!(new_status, SceneStatus::Generating);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = StoryboardEvent::PollingStopped {
            story_id: Uuid::nil(),
            reason: PollStopReason::AllReady,
            timestamp: chrono::Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "PollingStopped");
        assert_eq!(value["reason"], "all_ready");
    }
}
