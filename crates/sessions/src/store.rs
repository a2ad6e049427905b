//! Gateway-owned correlation session store.
//!
//! Persists session records in `sessions.json` under the configured state
//! path. Each correlation id maps to a [`CorrelationSession`] tracking the
//! outbound prompt and, once a human has answered, the reply text.
//!
//! The store is the only channel between the two webhook call paths: the
//! assistant handler writes a record and polls it, the messaging webhook
//! advances it to `replied`. Every mutation is flushed to disk before the
//! call returns, so a poll always observes a completed `mark_replied`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use vb_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lifecycle state of one exchange. Monotonic: a session never leaves
/// `Replied` once it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Replied,
}

/// A single request/reply exchange keyed by the assistant's session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSession {
    pub id: String,
    pub status: SessionStatus,
    /// The outbound prompt captured at creation.
    pub message: String,
    /// The chosen reply text. Only meaningful when `status == Replied`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Correlation session store backed by a JSON file.
pub struct SessionStore {
    sessions_path: PathBuf,
    sessions: RwLock<HashMap<String, CorrelationSession>>,
}

impl SessionStore {
    /// Load or create the store at `state_path/sessions/sessions.json`.
    pub fn new(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("sessions");
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;

        let sessions_path = dir.join("sessions.json");
        let sessions = if sessions_path.exists() {
            let raw = std::fs::read_to_string(&sessions_path).map_err(Error::Io)?;
            serde_json::from_str(&raw).unwrap_or_default()
        } else {
            HashMap::new()
        };

        tracing::info!(
            sessions = sessions.len(),
            path = %sessions_path.display(),
            "session store loaded"
        );

        Ok(Self {
            sessions_path,
            sessions: RwLock::new(sessions),
        })
    }

    /// Insert a new session in the `Created` state.
    ///
    /// A second `create` with the same id overwrites the old record
    /// (store-default semantics; the assistant's session ids are unique
    /// per exchange, so a collision means the caller restarted).
    pub fn create(&self, id: &str, message: &str) -> Result<()> {
        let now = Utc::now();
        let session = CorrelationSession {
            id: id.to_owned(),
            status: SessionStatus::Created,
            message: message.to_owned(),
            reply_message: None,
            created_at: now,
            updated_at: now,
        };

        {
            let mut sessions = self.sessions.write();
            if sessions.insert(id.to_owned(), session).is_some() {
                tracing::warn!(id, "overwrote an in-flight session record");
            }
        }
        self.flush()
    }

    /// Advance a session to `Replied` with the chosen text.
    ///
    /// Returns `Ok(false)` when no record exists for `id` — the store sees
    /// that as a no-op, the caller should treat it as an unknown
    /// correlation key. A repeated mark overwrites `reply_message`; the
    /// status stays `Replied`.
    pub fn mark_replied(&self, id: &str, reply_message: &str) -> Result<bool> {
        {
            let mut sessions = self.sessions.write();
            match sessions.get_mut(id) {
                Some(session) => {
                    session.status = SessionStatus::Replied;
                    session.reply_message = Some(reply_message.to_owned());
                    session.updated_at = Utc::now();
                }
                None => return Ok(false),
            }
        }
        self.flush()?;
        Ok(true)
    }

    /// Look up a session by its correlation id.
    pub fn get(&self, id: &str) -> Option<CorrelationSession> {
        self.sessions.read().get(id).cloned()
    }

    /// List all session records (diagnostics).
    pub fn list(&self) -> Vec<CorrelationSession> {
        self.sessions.read().values().cloned().collect()
    }

    /// Persist the current state to disk.
    pub fn flush(&self) -> Result<()> {
        let sessions = self.sessions.read();
        let json = serde_json::to_string_pretty(&*sessions)
            .map_err(|e| Error::Store(format!("serializing sessions: {e}")))?;
        std::fs::write(&self.sessions_path, json)
            .map_err(|e| Error::Store(format!("writing {}: {e}", self.sessions_path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn create_then_get_is_created_with_no_reply() {
        let (_tmp, store) = temp_store();
        store.create("S1", "Pick me up at 6").unwrap();

        let session = store.get("S1").unwrap();
        assert_eq!(session.status, SessionStatus::Created);
        assert_eq!(session.message, "Pick me up at 6");
        assert!(session.reply_message.is_none());
    }

    #[test]
    fn mark_replied_sets_status_and_text() {
        let (_tmp, store) = temp_store();
        store.create("S1", "Pick me up at 6").unwrap();

        assert!(store.mark_replied("S1", "はい").unwrap());
        let session = store.get("S1").unwrap();
        assert_eq!(session.status, SessionStatus::Replied);
        assert_eq!(session.reply_message.as_deref(), Some("はい"));
    }

    #[test]
    fn second_mark_overwrites_text_but_stays_replied() {
        let (_tmp, store) = temp_store();
        store.create("S1", "Pick me up at 6").unwrap();

        store.mark_replied("S1", "はい").unwrap();
        store.mark_replied("S1", "いいえ").unwrap();

        let session = store.get("S1").unwrap();
        assert_eq!(session.status, SessionStatus::Replied);
        assert_eq!(session.reply_message.as_deref(), Some("いいえ"));
    }

    #[test]
    fn mark_replied_on_unknown_id_reports_no_match() {
        let (_tmp, store) = temp_store();
        assert!(!store.mark_replied("missing", "はい").unwrap());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn duplicate_create_overwrites() {
        let (_tmp, store) = temp_store();
        store.create("S1", "first").unwrap();
        store.mark_replied("S1", "はい").unwrap();
        store.create("S1", "second").unwrap();

        let session = store.get("S1").unwrap();
        assert_eq!(session.status, SessionStatus::Created);
        assert_eq!(session.message, "second");
        assert!(session.reply_message.is_none());
    }

    #[test]
    fn records_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = SessionStore::new(tmp.path()).unwrap();
            store.create("S1", "Pick me up at 6").unwrap();
            store.mark_replied("S1", "はい").unwrap();
        }

        let reopened = SessionStore::new(tmp.path()).unwrap();
        let session = reopened.get("S1").unwrap();
        assert_eq!(session.status, SessionStatus::Replied);
        assert_eq!(session.reply_message.as_deref(), Some("はい"));
    }
}
