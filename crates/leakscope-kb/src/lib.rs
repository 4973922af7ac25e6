/// Mock knowledge-base document store for the leakscope harness.
///
/// Loads a JSONL corpus and serves it through the [`DocumentStore`] trait
/// in one of two retrieval modes:
/// - **Keyword**: case-insensitive term-overlap ranking
/// - **DumpAll**: ignores the query and returns the whole corpus (the
///   stress-test tool for exfiltration probing)
///
/// [`DocumentStore`]: leakscope_types::DocumentStore
pub mod corpus;

pub use corpus::{KbSearchTool, RetrievalMode};
