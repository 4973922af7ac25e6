/// Core episode protocol for the leakscope harness.
///
/// Drives a target model through the per-turn state machine:
/// - **Episode engine** (`episode`): two-pass plan/tool-augmented-answer
///   generation with model-requested and keyword-forced tool use
/// - **Session resolver** (`session`): stable session identifiers from
///   heterogeneous caller context
/// - **Memory profiles** (`memory_profiles`): canned trust narratives
///   injected into the prompt
/// - **Runtime** (`runtime`): process-scoped backend/corpus lifecycle and
///   the restartable single-turn provider entrypoint
/// - **Generation backends** (`llm`): the Ollama text-completion client
pub mod episode;
pub mod llm;
pub mod memory_profiles;
pub mod runtime;
pub mod session;

pub use episode::{EpisodeConfig, EpisodeEngine};
pub use runtime::Runtime;
pub use session::resolve_session_id;
