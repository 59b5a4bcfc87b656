//! Fake image generator
//!
//! Counts fetches, can fail chosen scenes, and can hold every fetch on a
//! gate until the test releases it.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storyboard_editor::client::ImageGeneratorApi;
use storyboard_editor::error::{EditorError, EditorResult};
use storyboard_editor::models::GeneratedImage;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeImageGenerator {
    images: Mutex<HashMap<u32, GeneratedImage>>,
    failing: Mutex<HashSet<u32>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose fetches wait until the returned gate gets permits
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let fake = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (fake, gate)
    }

    /// Publish an image for a scene
    pub fn publish(&self, scene_number: u32, image_id: &str, url: &str) {
        self.images.lock().unwrap().insert(
            scene_number,
            GeneratedImage {
                image_id: image_id.to_string(),
                url: url.to_string(),
                created_at: None,
                prompt_text: Some(format!("prompt for scene {}", scene_number)),
            },
        );
    }

    pub fn fail_scene(&self, scene_number: u32) {
        self.failing.lock().unwrap().insert(scene_number);
    }

    pub fn heal_scene(&self, scene_number: u32) {
        self.failing.lock().unwrap().remove(&scene_number);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGeneratorApi for FakeImageGenerator {
    async fn fetch_generated_image(
        &self,
        _story_id: Uuid,
        scene_number: u32,
    ) -> EditorResult<Option<GeneratedImage>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&scene_number) {
            return Err(EditorError::Remote {
                status: 503,
                message: "generator unavailable".to_string(),
            });
        }
        Ok(self.images.lock().unwrap().get(&scene_number).cloned())
    }
}
