//! Harness configuration, parsed from `configs/base.yaml`.
//!
//! Loaded once per process and cached by the caller; there is no hot
//! reload. Missing files and invalid values are fatal at load time with a
//! message naming the offending file or key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::LeakscopeError;
use crate::records::{ToolTrust, TrustProfile};

/// Built-in forced-tool trigger substrings.
///
/// This list is a policy knob for the experiment: it guarantees tool
/// invocation coverage even when the model never requests the tool itself.
/// Override it with `tool_triggers` in the config file.
pub const DEFAULT_TOOL_TRIGGERS: [&str; 8] = [
    "knowledge base",
    "kb",
    "token",
    "secret",
    "credential",
    "runbook",
    "api key",
    "internal wiki",
];

/// Config file candidates, tried in order from the working directory.
const CONFIG_CANDIDATES: [&str; 2] = ["configs/base.yaml", "base.yaml"];

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Model identifier passed to the generation backend.
    pub model: String,
    /// Base URL of the Ollama-compatible backend.
    pub ollama_base_url: String,
    /// Request timeout in seconds. The `LEAKSCOPE_TIMEOUT_S` environment
    /// variable overrides this at backend construction time.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Default for `AgentState::memory_enabled` on fresh sessions.
    #[serde(default = "default_true")]
    pub memory_enabled: bool,
    /// Default for `AgentState::tool_access_enabled` on fresh sessions.
    #[serde(default = "default_true")]
    pub tool_access_enabled: bool,
    #[serde(default)]
    pub trust_profile: TrustProfile,
    #[serde(default)]
    pub tool_trust: ToolTrust,
    /// Selects the corpus file `data/kb_<variant>.jsonl` and with it the
    /// retrieval mode.
    #[serde(default = "default_kb_variant")]
    pub kb_variant: String,
    /// Forced-tool trigger substrings, matched case-insensitively against
    /// the user utterance.
    #[serde(default = "default_tool_triggers")]
    pub tool_triggers: Vec<String>,
    pub run: RunConfig,
}

/// Batch-driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Episodes per run (per condition, for sweeps).
    pub n_episodes: u32,
    /// RNG seed for reproducible prompt sampling.
    pub seed: u64,
    /// Output directory for JSONL logs and session files.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_kb_variant() -> String {
    "B".to_string()
}

fn default_tool_triggers() -> Vec<String> {
    DEFAULT_TOOL_TRIGGERS.iter().map(|s| s.to_string()).collect()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl HarnessConfig {
    /// Load configuration from the default search path:
    /// `configs/base.yaml`, then `base.yaml`.
    pub fn load() -> Result<Self, LeakscopeError> {
        for candidate in CONFIG_CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from(path);
            }
        }
        Err(LeakscopeError::Config(format!(
            "no config file found; looked for {} (run from the repository root)",
            CONFIG_CANDIDATES.join(" and ")
        )))
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, LeakscopeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeakscopeError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: HarnessConfig = serde_yaml::from_str(&content).map_err(|e| {
            LeakscopeError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded config for internal consistency.
    ///
    /// Checks:
    /// - `model` and `ollama_base_url` are non-blank
    /// - `kb_variant` is non-blank
    /// - the trigger list is non-empty with no blank entries
    /// - `run.n_episodes` is positive
    pub fn validate(&self) -> Result<(), LeakscopeError> {
        if self.model.trim().is_empty() {
            return Err(LeakscopeError::Config("missing 'model'".to_string()));
        }
        if self.ollama_base_url.trim().is_empty() {
            return Err(LeakscopeError::Config(
                "missing 'ollama_base_url'".to_string(),
            ));
        }
        if self.kb_variant.trim().is_empty() {
            return Err(LeakscopeError::Config("missing 'kb_variant'".to_string()));
        }
        if self.tool_triggers.is_empty() {
            return Err(LeakscopeError::Config(
                "'tool_triggers' must not be empty (remove the key to use the built-in list)"
                    .to_string(),
            ));
        }
        if self.tool_triggers.iter().any(|t| t.trim().is_empty()) {
            return Err(LeakscopeError::Config(
                "'tool_triggers' contains a blank entry".to_string(),
            ));
        }
        if self.run.n_episodes == 0 {
            return Err(LeakscopeError::Config(
                "'run.n_episodes' must be positive (got 0)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_YAML: &str = "\
model: llama3
ollama_base_url: \"http://localhost:11434\"
run:
  n_episodes: 5
  seed: 7
";

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config(MINIMAL_YAML);
        let config = HarnessConfig::load_from(file.path()).unwrap();

        assert_eq!(config.model, "llama3");
        assert_eq!(config.request_timeout_secs, 600);
        assert!(config.memory_enabled);
        assert!(config.tool_access_enabled);
        assert_eq!(config.trust_profile, TrustProfile::M0);
        assert_eq!(config.tool_trust, ToolTrust::Untrusted);
        assert_eq!(config.kb_variant, "B");
        assert_eq!(config.tool_triggers.len(), DEFAULT_TOOL_TRIGGERS.len());
        assert_eq!(config.run.out_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let file = write_config(
            "\
model: mistral
ollama_base_url: \"http://10.0.0.5:11434\"
memory_enabled: false
trust_profile: M2
tool_trust: trusted
kb_variant: A
tool_triggers:
  - secret
run:
  n_episodes: 2
  seed: 1
  out_dir: /tmp/leakscope-out
",
        );
        let config = HarnessConfig::load_from(file.path()).unwrap();

        assert!(!config.memory_enabled);
        assert_eq!(config.trust_profile, TrustProfile::M2);
        assert_eq!(config.tool_trust, ToolTrust::Trusted);
        assert_eq!(config.kb_variant, "A");
        assert_eq!(config.tool_triggers, vec!["secret".to_string()]);
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let file = write_config(
            "\
ollama_base_url: \"http://localhost:11434\"
run:
  n_episodes: 5
  seed: 7
",
        );
        let err = HarnessConfig::load_from(file.path()).unwrap_err();
        match err {
            LeakscopeError::Config(msg) => assert!(msg.contains("model"), "got: {msg}"),
            other => panic!("expected Config error, got: {other}"),
        }
    }

    #[test]
    fn test_blank_model_is_fatal() {
        let file = write_config(
            "\
model: \"  \"
ollama_base_url: \"http://localhost:11434\"
run:
  n_episodes: 5
  seed: 7
",
        );
        assert!(HarnessConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_zero_episodes_is_fatal() {
        let file = write_config(
            "\
model: llama3
ollama_base_url: \"http://localhost:11434\"
run:
  n_episodes: 0
  seed: 7
",
        );
        let err = HarnessConfig::load_from(file.path()).unwrap_err();
        match err {
            LeakscopeError::Config(msg) => assert!(msg.contains("n_episodes"), "got: {msg}"),
            other => panic!("expected Config error, got: {other}"),
        }
    }

    #[test]
    fn test_empty_trigger_list_is_fatal() {
        let file = write_config(
            "\
model: llama3
ollama_base_url: \"http://localhost:11434\"
tool_triggers: []
run:
  n_episodes: 5
  seed: 7
",
        );
        assert!(HarnessConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = HarnessConfig::load_from(Path::new("/nonexistent/leakscope.yaml")).unwrap_err();
        match err {
            LeakscopeError::Config(msg) => {
                assert!(msg.contains("/nonexistent/leakscope.yaml"), "got: {msg}")
            }
            other => panic!("expected Config error, got: {other}"),
        }
    }
}
