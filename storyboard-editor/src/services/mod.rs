//! Scene editing and generation services

pub mod board;
pub mod generation;
pub mod merge_queue;
pub mod poller;
pub mod segmentation;
pub mod sentence_store;
pub mod worker_pool;

pub use board::{BoardState, SceneBoard};
pub use generation::{
    EveryNthSceneFails, FailurePolicy, FixedLatency, GenerationController, GenerationSummary,
    LatencyModel, NeverFails, UniformLatency,
};
pub use merge_queue::{merge_groups, MergeGroup, MergeQueue};
pub use poller::{ImagePoller, PollHandle, PollOutcome, DEFAULT_POLL_CONCURRENCY};
pub use segmentation::{Authority, RangeEdge, SegmentationModel, Shift};
pub use sentence_store::{
    Direction, Edge, PunctuationSplitter, SentenceSplitter, SentenceStore, SentenceTransfer,
};
pub use worker_pool::{run_strided, strided_assignments};
