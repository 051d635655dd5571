pub mod generation;
pub mod merge;
pub mod stats;

pub use generation::{GenerationCoordinator, GenerationSettings, ShardOutcome};
pub use merge::{merge_dataset, merge_records};
pub use stats::{GenerationStats, MergeStats};
