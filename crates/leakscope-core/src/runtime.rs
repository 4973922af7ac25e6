//! Process-scoped runtime and the single-turn provider entrypoint.
//!
//! The runtime owns the long-lived collaborators (generation backend,
//! knowledge-base corpus, active model) with an explicit lifecycle:
//! initialize once at process start, re-initialize the corpus only when a
//! caller-supplied variant actually changes.
//!
//! `handle_turn` is the restartable entrypoint the external harness
//! drives: it must be correct even when the whole process is re-created
//! between turns, so every piece of cross-turn state flows through the
//! session store and nothing else.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use leakscope_kb::{KbSearchTool, RetrievalMode};
use leakscope_types::config::HarnessConfig;
use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::{AgentState, SessionRecord, TurnRequest, TurnResponse, TurnVars};
use leakscope_types::traits::{DocumentStore, EpisodeSink, GenerationBackend, SessionStore};

use crate::episode::{EpisodeConfig, EpisodeEngine};
use crate::llm::OllamaBackend;
use crate::session::resolve_session_id;

/// Default directory holding the `kb_<variant>.jsonl` corpus files.
const DEFAULT_DATA_DIR: &str = "data";

/// Process-scoped harness state.
pub struct Runtime {
    config: HarnessConfig,
    backend: Arc<dyn GenerationBackend>,
    kb: Arc<dyn DocumentStore>,
    kb_variant: String,
    model: String,
    data_dir: PathBuf,
}

impl Runtime {
    /// Initialize from config: Ollama backend plus the corpus selected by
    /// `config.kb_variant`, loaded from the default `data/` directory.
    pub fn initialize(config: HarnessConfig) -> Result<Self, LeakscopeError> {
        Self::initialize_with_data_dir(config, DEFAULT_DATA_DIR)
    }

    /// Initialize with an explicit corpus directory.
    pub fn initialize_with_data_dir(
        config: HarnessConfig,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, LeakscopeError> {
        let data_dir = data_dir.into();
        let backend = Arc::new(OllamaBackend::from_config(&config)?);
        let kb = Arc::new(load_corpus(&data_dir, &config.kb_variant)?);
        info!(
            model = %config.model,
            kb_variant = %config.kb_variant,
            "runtime initialized"
        );
        Ok(Self {
            kb_variant: config.kb_variant.clone(),
            model: config.model.clone(),
            backend,
            kb,
            config,
            data_dir,
        })
    }

    /// Build a runtime around injected collaborators. Used by tests and by
    /// drivers that bring their own backend.
    pub fn new(
        config: HarnessConfig,
        backend: Arc<dyn GenerationBackend>,
        kb: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            kb_variant: config.kb_variant.clone(),
            model: config.model.clone(),
            backend,
            kb,
            config,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Reload the corpus if the requested variant differs from the active
    /// one. A `None` or blank override keeps the current corpus.
    pub fn ensure_variant(&mut self, variant: Option<&str>) -> Result<(), LeakscopeError> {
        let Some(variant) = variant.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        if variant == self.kb_variant {
            return Ok(());
        }
        self.kb = Arc::new(load_corpus(&self.data_dir, variant)?);
        info!(from = %self.kb_variant, to = %variant, "switched knowledge-base variant");
        self.kb_variant = variant.to_string();
        Ok(())
    }

    /// Apply a per-turn model override. Blank overrides are ignored.
    pub fn ensure_model(&mut self, model: Option<&str>) {
        if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
            if model != self.model {
                info!(from = %self.model, to = %model, "switched model");
                self.model = model.to_string();
            }
        }
    }

    /// Seed a fresh agent state from config defaults, overridden by any
    /// caller-supplied knobs. Every knob always exists with a defined
    /// default.
    pub fn seed_state(&self, vars: &TurnVars) -> AgentState {
        AgentState {
            memory_enabled: vars.memory_enabled.unwrap_or(self.config.memory_enabled),
            tool_access_enabled: vars
                .tool_access_enabled
                .unwrap_or(self.config.tool_access_enabled),
            trust_profile: vars.trust_profile.unwrap_or(self.config.trust_profile),
            tool_trust: vars.tool_trust.unwrap_or(self.config.tool_trust),
            history: Vec::new(),
            memory: Vec::new(),
        }
    }

    /// An episode engine over the runtime's current backend, corpus, and
    /// model.
    pub fn engine(&self) -> EpisodeEngine {
        EpisodeEngine::new(
            self.backend.clone(),
            self.kb.clone(),
            EpisodeConfig::new(self.model.clone(), self.config.tool_triggers.clone()),
        )
    }

    /// Run one provider turn with session continuity.
    ///
    /// Resolves the session id, loads or seeds the state, runs one
    /// episode, persists the incremented turn, and appends the analysis
    /// record. Persistence and logging failures are tolerated (logged,
    /// the turn still succeeds); episode failures propagate with nothing
    /// persisted.
    pub async fn handle_turn(
        &mut self,
        store: &dyn SessionStore,
        sink: &dyn EpisodeSink,
        request: &TurnRequest,
    ) -> Result<TurnResponse, LeakscopeError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let vars = &request.context.vars;

        self.ensure_variant(vars.kb_variant.as_deref())?;
        self.ensure_model(vars.model.as_deref());

        let session_id = resolve_session_id(&request.context);

        let (mut state, turn_index) = match store.load(&session_id) {
            Some(record) => (record.state, record.turn_index),
            None => (self.seed_state(vars), 0),
        };

        let record = self.engine().run_episode(&mut state, &request.prompt).await?;

        let saved = store.save(
            &session_id,
            &SessionRecord {
                state,
                turn_index: turn_index + 1,
            },
        );
        if let Err(e) = saved {
            warn!(
                session_id = %session_id,
                error = %e,
                "session save failed, continuity for future turns is lost"
            );
            let incident = json!({
                "ts": Utc::now().to_rfc3339(),
                "type": "session_save_failed",
                "session_id": &session_id,
                "error": e.to_string(),
            });
            if let Err(sink_err) = sink.append(&incident) {
                warn!(error = %sink_err, "failed to log session-save incident");
            }
        }

        let log_record = json!({
            "ts": Utc::now().to_rfc3339(),
            "request_id": request_id,
            "session_id": &session_id,
            "turn_index": turn_index,
            "prompt": &request.prompt,
            "vars": serde_json::to_value(vars)?,
            "kb_variant": &self.kb_variant,
            "model": &self.model,
            "latency_ms": started.elapsed().as_millis() as u64,
            "model_raw_output": &record.model_raw_output,
            "model_final_output": &record.model_final_output,
            "tool_used": record.tool_used,
            "tool_forced": record.tool_forced,
            "tool_requested_by_model": record.tool_requested_by_model,
            "tool_query": &record.tool_query,
            "tool_docs": &record.tool_docs,
            "state": record.state,
        });
        if let Err(e) = sink.append(&log_record) {
            warn!(error = %e, "failed to append turn record to analysis log");
        }

        Ok(TurnResponse {
            output: record.model_final_output,
            session_id,
        })
    }
}

fn load_corpus(data_dir: &std::path::Path, variant: &str) -> Result<KbSearchTool, LeakscopeError> {
    let path = data_dir.join(format!("kb_{variant}.jsonl"));
    KbSearchTool::load(&path, RetrievalMode::for_variant(variant))
}
