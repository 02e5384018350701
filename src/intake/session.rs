//! Session store: one conversation state per open chat widget.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::state::ConversationState;

/// A session's state behind its own lock. A turn holds the lock from start to
/// finish, so turns for one session never interleave.
pub type SharedState = Arc<Mutex<ConversationState>>;

/// In-memory session store. Nothing survives a restart.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedState>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Open a new session.
    pub async fn create(&self) -> (Uuid, SharedState) {
        let id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(ConversationState::new()));
        self.sessions.write().await.insert(id, Arc::clone(&state));
        debug!(session_id = %id, "Chat session opened");
        (id, state)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedState> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Close a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!(session_id = %id, "Chat session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    ///
    /// A session whose lock is held is mid-turn and is kept.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let now = chrono::Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, state| match state.try_lock() {
            Ok(guard) => guard.idle_for(now) <= ttl,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Pruned idle chat sessions");
        }
        pruned
    }
}

/// Spawn a background task that prunes idle sessions every 60 seconds.
pub fn spawn_prune_task(store: Arc<SessionStore>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            store.prune_idle(ttl).await;
        }
    })
}
