use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::task::JoinHandle;

use crate::types::Role;

const TOKEN_PREFIX: &str = "rately";
const TOKEN_BYTES: usize = 32;

/// A server-held record binding an opaque token to a principal.
/// The role is a snapshot taken at creation; a later role change does not
/// affect already-issued sessions.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Process-wide session registry. Created once at startup and shared by all
/// request handlers; the background sweeper reclaims expired entries but
/// `lookup` is the sole authority on validity.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for the given user and role, returning the opaque
    /// token handed to the client.
    pub fn create(&self, user_id: &str, role: Role, ttl: Duration) -> String {
        let token = generate_token();
        let session = Session {
            user_id: user_id.to_string(),
            role,
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        };

        self.write().insert(token.clone(), session);
        token
    }

    /// Resolves a token to its session. Expired entries are treated as
    /// absent regardless of whether the sweeper has run.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        let sessions = self.read();
        let session = sessions.get(token)?;
        if session.is_expired() {
            return None;
        }
        Some(session.clone())
    }

    /// Destroys a session. Destroying an unknown token is a no-op.
    pub fn destroy(&self, token: &str) {
        self.write().remove(token);
    }

    /// Removes expired entries, returning how many were reclaimed.
    pub fn sweep(&self) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the background sweep task. The returned handle stops the task
    /// on `stop()` or drop.
    pub fn start_sweeper(self: Arc<Self>, interval: Duration) -> SweeperHandle {
        let store = self;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep();
                if removed > 0 {
                    tracing::debug!("session sweep reclaimed {removed} expired sessions");
                }
            }
        });
        SweeperHandle { task }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle to the background sweep task. Aborts the task when stopped or
/// dropped so shutdown does not leak the interval loop.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Generates an unguessable session token: 32 bytes of thread-RNG entropy,
/// hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("{TOKEN_PREFIX}_{}", hex::encode(bytes))
}
