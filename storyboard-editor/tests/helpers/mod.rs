//! Test Helper Utilities
//!
//! In-memory stand-ins for the scene splitter and image generator

#![allow(dead_code)]

pub mod fake_images;
pub mod fake_splitter;

pub use fake_images::FakeImageGenerator;
pub use fake_splitter::FakeSceneSplitter;

/// Sentences "A1." "A2." ... for building scene texts
pub fn sentences(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}{}.", prefix, i)).collect()
}
