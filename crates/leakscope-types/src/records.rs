//! Shared data types for the leakscope harness.
//!
//! Everything that crosses a crate boundary lives here: the conversation
//! transcript, the per-conversation agent state, the durable session record,
//! the per-turn episode record, and the request/response envelope used by
//! the single-shot provider entrypoint.

use serde::{Deserialize, Serialize};

// ============================================================
// Conversation transcript
// ============================================================

/// Role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Upper-case label used when rendering the transcript into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            ChatRole::User => "USER",
            ChatRole::Assistant => "ASSISTANT",
        }
    }
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

// ============================================================
// Trust knobs
// ============================================================

/// Selects which canned memory narrative is injected into the prompt.
///
/// The profiles simulate prior user-verification context, from neutral (`M0`)
/// through high-trust (`M2`) to actively suspicious (`M3`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustProfile {
    #[default]
    M0,
    M1,
    M2,
    M3,
}

/// Trust label attached to tool-retrieved content in the prompt.
///
/// Independent of the content's real provenance: the point is to study
/// whether models over-trust content labeled safe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTrust {
    Trusted,
    #[default]
    Untrusted,
}

impl ToolTrust {
    /// Lower-case label used in the `TOOL_RESULT (<trust>)` prompt section.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            ToolTrust::Trusted => "trusted",
            ToolTrust::Untrusted => "untrusted",
        }
    }
}

// ============================================================
// Agent state and session record
// ============================================================

/// Mutable per-conversation record.
///
/// All four knobs are always present with defined defaults; there is no
/// conditional-existence handling anywhere. The transcript is append-only
/// and never truncated or reordered by the core; size management belongs
/// to whoever owns the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Whether a synthetic memory block is injected into every prompt.
    pub memory_enabled: bool,
    /// Whether tool invocation is permitted this conversation.
    pub tool_access_enabled: bool,
    #[serde(default)]
    pub trust_profile: TrustProfile,
    #[serde(default)]
    pub tool_trust: ToolTrust,
    /// Full transcript. Grows by exactly 2 per completed episode.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Free-form notes, appended only when `memory_enabled`. The current
    /// protocol does not read these back.
    #[serde(default)]
    pub memory: Vec<String>,
}

impl AgentState {
    /// Create a fresh state with empty transcript and default trust knobs.
    pub fn new(memory_enabled: bool, tool_access_enabled: bool) -> Self {
        Self {
            memory_enabled,
            tool_access_enabled,
            trust_profile: TrustProfile::default(),
            tool_trust: ToolTrust::default(),
            history: Vec::new(),
            memory: Vec::new(),
        }
    }

    /// Append a transcript entry. The transcript is append-only.
    pub fn push_history(&mut self, role: ChatRole, content: impl Into<String>) {
        self.history.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    /// Append a memory note. No-op when memory is disabled.
    pub fn remember(&mut self, note: impl Into<String>) {
        if self.memory_enabled {
            self.memory.push(note.into());
        }
    }

    /// Capture the configuration knobs for the episode record.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            memory_enabled: self.memory_enabled,
            tool_access_enabled: self.tool_access_enabled,
            trust_profile: self.trust_profile,
            tool_trust: self.tool_trust,
            memory_size: self.memory.len(),
        }
    }
}

/// Durable record persisted per session id.
///
/// `turn_index` counts completed episodes for the session and increases by
/// exactly 1 per successful turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub state: AgentState,
    pub turn_index: u64,
}

// ============================================================
// Knowledge-base documents
// ============================================================

/// One document in the mock knowledge-base corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbDocument {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// Logged summary of a retrieved document (id + title, no body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbDocSummary {
    pub id: String,
    pub title: String,
}

impl From<&KbDocument> for KbDocSummary {
    fn from(doc: &KbDocument) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
        }
    }
}

// ============================================================
// Episode record
// ============================================================

/// Snapshot of the state's configuration knobs at episode execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub memory_enabled: bool,
    pub tool_access_enabled: bool,
    pub trust_profile: TrustProfile,
    pub tool_trust: ToolTrust,
    pub memory_size: usize,
}

/// Immutable result of one completed episode.
///
/// This is the unit persisted to the analysis log: both model outputs, the
/// full tool metadata, and the state snapshot taken when the episode ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub user_prompt: String,
    /// Raw first-pass output, before any tool round-trip.
    pub model_raw_output: String,
    /// Final answer: tool-augmented, fallback, or the first pass unchanged.
    pub model_final_output: String,
    pub tool_used: bool,
    pub tool_forced: bool,
    pub tool_requested_by_model: bool,
    pub tool_query: Option<String>,
    pub tool_docs: Vec<KbDocSummary>,
    /// Bounded preview of the rendered tool block, for the log only.
    pub tool_text_preview: Option<String>,
    pub state: StateSnapshot,
    pub transcript: Vec<ChatMessage>,
}

// ============================================================
// Generation request
// ============================================================

/// A single text-completion request to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: f64,
}

// ============================================================
// Provider turn envelope
// ============================================================

/// Caller-supplied per-turn overrides.
///
/// Every field is optional; unknown fields in the incoming JSON are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnVars {
    #[serde(alias = "sessionId")]
    pub session_id: Option<String>,
    pub memory_enabled: Option<bool>,
    pub tool_access_enabled: Option<bool>,
    pub trust_profile: Option<TrustProfile>,
    pub tool_trust: Option<ToolTrust>,
    pub kb_variant: Option<String>,
    pub model: Option<String>,
}

/// Heterogeneous caller context accompanying a turn request.
///
/// The test object is kept as opaque JSON so the session resolver can fall
/// back to hashing it whole when no explicit identifier is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestContext {
    pub vars: TurnVars,
    pub test: Option<serde_json::Value>,
}

/// One turn submitted to the provider entrypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: RequestContext,
}

/// Provider entrypoint response: the final answer plus the resolved session
/// id, returned so callers can keep continuity explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub output: String,
    pub session_id: String,
}

// ============================================================
// Tests
// ============================================================
