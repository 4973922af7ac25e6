//! Generation backend implementations.
//!
//! Provides the concrete [`GenerationBackend`] used by the harness:
//! - **Ollama** (`OllamaBackend`): local models via the Ollama generate API
//!
//! [`GenerationBackend`]: leakscope_types::GenerationBackend

pub mod ollama;

pub use ollama::OllamaBackend;
