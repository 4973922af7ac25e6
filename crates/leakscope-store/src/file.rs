//! File-backed [`SessionStore`] implementation.
//!
//! Each session id maps to `<dir>/<sanitized-id>.json` holding a
//! [`SessionRecord`]. Loads never fail the caller's turn: a missing,
//! unreadable, or corrupted file is reported as absent and logged.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::warn;

use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::SessionRecord;
use leakscope_types::traits::SessionStore;

/// Maximum length of a sanitized session filename stem.
const MAX_KEY_LEN: usize = 120;

/// Durable per-session storage rooted at a directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, LeakscopeError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            LeakscopeError::Session(format!(
                "failed to create sessions directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    /// The file a session id persists to.
    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(session_id)))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, session_id: &str) -> Option<SessionRecord> {
        let path = self.session_path(session_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(
                    session_id,
                    path = %path.display(),
                    error = %e,
                    "failed to read session file, treating as fresh session"
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    session_id,
                    path = %path.display(),
                    error = %e,
                    "failed to deserialize session record, treating as fresh session"
                );
                None
            }
        }
    }

    fn save(&self, session_id: &str, record: &SessionRecord) -> Result<(), LeakscopeError> {
        let path = self.session_path(session_id);
        let payload = serde_json::to_string(record)?;
        std::fs::write(&path, payload).map_err(|e| {
            LeakscopeError::Session(format!("failed to write {}: {e}", path.display()))
        })
    }
}

/// Reduce a session id to a filesystem-safe key.
///
/// Keeps alphanumerics plus hyphen/underscore, truncates to a bounded
/// length, and falls back to a content hash of the raw id when nothing
/// survives sanitization.
fn sanitize_key(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_KEY_LEN)
        .collect();

    if safe.is_empty() {
        let digest = Sha256::digest(session_id.as_bytes());
        hex::encode(&digest[..8])
    } else {
        safe
    }
}
