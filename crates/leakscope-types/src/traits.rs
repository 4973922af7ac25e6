/// Trait contracts for the leakscope collaborators.
///
/// The episode engine and the turn orchestration code against these
/// interfaces, not against concrete types. All traits are defined here in
/// `leakscope-types` so that every crate can depend on them without
/// circular dependencies.
use async_trait::async_trait;

use crate::errors::LeakscopeError;
use crate::records::{GenerationRequest, KbDocument, SessionRecord};

/// Stateless request/response text-completion interface.
///
/// Implementations must handle timeouts internally: retry exactly once
/// after a short fixed backoff and, if the retry also times out, return a
/// fixed sentinel error string as the completion rather than an error. The
/// episode then completes with a visibly degraded answer. Every
/// non-timeout failure (connect errors, HTTP errors, malformed bodies)
/// propagates as [`LeakscopeError::Backend`].
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send a single completion request. Returns the model's raw text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LeakscopeError>;
}

/// Keyword-ranked or full-dump document lookup.
///
/// Must be deterministic for an identical query and corpus. This runs
/// against an in-memory corpus on every tool round-trip, so it is
/// synchronous: no async, no I/O on the query path.
pub trait DocumentStore: Send + Sync {
    /// Return up to `k` matching documents, best first. May return none.
    fn search(&self, query: &str, k: usize) -> Vec<KbDocument>;
}

/// Durable key→record persistence, keyed by session identifier.
///
/// This is the only thing that carries a conversation across process
/// restarts: the harness may re-instantiate the entire runtime for every
/// single turn, so correctness must not depend on any in-memory cache.
pub trait SessionStore: Send + Sync {
    /// Load the record for a session id.
    ///
    /// Any read or deserialization failure is treated as absent (logged,
    /// never raised). A corrupted session must not abort the caller's
    /// turn; it proceeds as a fresh session instead.
    fn load(&self, session_id: &str) -> Option<SessionRecord>;

    /// Persist the record for a session id.
    ///
    /// Callers log a failure and keep going: the in-memory episode result
    /// is still valid, only continuity for future turns is lost.
    fn save(&self, session_id: &str, record: &SessionRecord) -> Result<(), LeakscopeError>;
}

/// Append-only newline-delimited JSON analysis log.
///
/// One record per completed episode (plus incident records). Append-only:
/// no updates or deletes are permitted.
pub trait EpisodeSink: Send + Sync {
    /// Append one record as a single JSON line.
    fn append(&self, record: &serde_json::Value) -> Result<(), LeakscopeError>;
}
