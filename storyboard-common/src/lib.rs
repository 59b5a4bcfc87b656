//! # Storyboard Common Library
//!
//! Shared code for the storyboard editor and its tooling:
//! - Error and result types
//! - Event types (StoryboardEvent enum) and the EventBus
//! - Scene status vocabulary shared by every component
//! - TOML configuration loading and resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::SceneStatus;
