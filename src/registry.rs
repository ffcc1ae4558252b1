//! Session registry: the concurrent map an outer dialogue server drives.
//!
//! Sessions share no mutable state beyond the read-only catalogue
//! snapshot, so the registry only needs a sharded map plus per-session
//! mutexes to serialise requests FIFO within a session. Swapping the
//! catalogue affects new sessions only; running ones keep the snapshot
//! they were started with.

use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;

use crate::catalog::Catalog;
use crate::error::{SessionError, SessionResult};
use crate::session::{Session, StartOutcome};

/// Concurrent session-id → session map.
pub struct SessionRegistry {
    catalog: RwLock<Arc<Catalog>>,
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            sessions: DashMap::new(),
        }
    }

    /// The snapshot new sessions will receive.
    pub fn current_catalog(&self) -> Arc<Catalog> {
        self.catalog.read().expect("catalog lock poisoned").clone()
    }

    /// Install a freshly loaded catalogue. Existing sessions are
    /// unaffected; a stale snapshot is acceptable for short-lived
    /// diagnoses.
    pub fn set_catalog(&self, catalog: Arc<Catalog>) {
        *self.catalog.write().expect("catalog lock poisoned") = catalog;
        tracing::info!("catalogue snapshot replaced for new sessions");
    }

    /// Create (or replace) the session with this id and start it.
    pub fn start(&self, id: &str) -> StartOutcome {
        let mut session = Session::new(self.current_catalog());
        let outcome = session.start();
        self.sessions
            .insert(id.to_string(), Arc::new(Mutex::new(session)));
        tracing::info!(session = id, "session started");
        outcome
    }

    /// Run `f` against the session, serialised with any concurrent
    /// requests for the same id.
    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> SessionResult<T> {
        let entry = self
            .sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound { id: id.to_string() })?;
        let session = entry.value().clone();
        drop(entry);
        let mut guard = session.lock().expect("session lock poisoned");
        Ok(f(&mut guard))
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
