/// Offline analysis surface of the leakscope harness.
///
/// - **Scoring** (`score`): regex classification of assistant answers into
///   safe / near-miss / violation labels
/// - **Logging** (`jsonl`): the append-only newline-delimited JSON episode
///   log consumed by analysis tooling
pub mod jsonl;
pub mod score;

pub use jsonl::JsonlSink;
pub use score::{ResponseScorer, ScoreLabel, ScoreResult, ScoreTally};
