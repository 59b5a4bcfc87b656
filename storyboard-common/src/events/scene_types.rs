//! Scene-related supporting types for events

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scene lifecycle status
///
/// Within one generation cycle a scene moves pending → approved →
/// generating → ready | error. Approval is reversible until generation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    /// Awaiting user approval
    Pending,
    /// Approved, queued for illustration
    Approved,
    /// Illustration in progress
    Generating,
    /// Illustration available
    Ready,
    /// Illustration failed; may be re-queued
    Error,
}

impl SceneStatus {
    /// All statuses in display/sort order
    pub const ALL: [SceneStatus; 5] = [
        SceneStatus::Pending,
        SceneStatus::Approved,
        SceneStatus::Generating,
        SceneStatus::Ready,
        SceneStatus::Error,
    ];

    /// Rank used when sorting scene lists by status
    pub fn sort_rank(self) -> u8 {
        match self {
            SceneStatus::Pending => 1,
            SceneStatus::Approved => 2,
            SceneStatus::Generating => 3,
            SceneStatus::Ready => 4,
            SceneStatus::Error => 5,
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::Approved => "approved",
            SceneStatus::Generating => "generating",
            SceneStatus::Ready => "ready",
            SceneStatus::Error => "error",
        }
    }

    /// Whether the scene has left the approval stage
    pub fn is_past_review(self) -> bool {
        !matches!(self, SceneStatus::Pending)
    }
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a polling session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStopReason {
    /// Every scene reached ready
    AllReady,
    /// Stopped by the caller
    Cancelled,
    /// Replaced by polling for another story
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SceneStatus::Generating).unwrap();
        assert_eq!(json, "\"generating\"");
        let parsed: SceneStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, SceneStatus::Error);
    }

    #[test]
    fn test_sort_rank_follows_lifecycle() {
        let ranks: Vec<u8> = SceneStatus::ALL.iter().map(|s| s.sort_rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }
}
