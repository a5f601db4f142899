//! Live session tracking.
//!
//! Sessions are opened by connection handlers once a payload calls back or
//! a bind connection succeeds. The table only tracks identity and liveness;
//! the connection collaborator flips the shared [`SessionLiveness`] flag when
//! the peer goes away, and the console reaps dead sessions between commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::ids::SessionId;

const SESSIONS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sessions");

/// Session table failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No open session has this id.
    #[error("Invalid session given: {id}!")]
    NotFound {
        /// Requested id.
        id: SessionId,
    },
}

/// Shared liveness flag for one session.
#[derive(Debug, Clone)]
pub struct SessionLiveness(Arc<AtomicBool>);

impl SessionLiveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Returns `true` until the session is marked closed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Marks the session closed.
    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Listing row for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Remote platform, e.g. `linux`.
    pub platform: String,
    /// Session type, e.g. `shell`.
    pub session_type: String,
    /// Remote host.
    pub host: String,
    /// Remote port.
    pub port: u16,
}

#[derive(Debug)]
struct SessionEntry {
    summary: SessionSummary,
    liveness: SessionLiveness,
}

#[derive(Debug, Default)]
struct SessionState {
    next_id: u32,
    sessions: IndexMap<SessionId, SessionEntry>,
}

/// Process-wide table of open sessions; clones share state.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    state: Arc<Mutex<SessionState>>,
}

impl SessionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new live session.
    pub fn open(
        &self,
        platform: &str,
        session_type: &str,
        host: &str,
        port: u16,
    ) -> (SessionId, SessionLiveness) {
        let mut state = self.state.lock();
        let id = SessionId::new(state.next_id);
        state.next_id = state.next_id.wrapping_add(1);
        let liveness = SessionLiveness::new();
        state.sessions.insert(
            id,
            SessionEntry {
                summary: SessionSummary {
                    id,
                    platform: platform.to_owned(),
                    session_type: session_type.to_owned(),
                    host: host.to_owned(),
                    port,
                },
                liveness: liveness.clone(),
            },
        );
        info!(target: SESSIONS_TARGET, session = %id, platform, host, port, "session opened");
        (id, liveness)
    }

    /// Returns `true` when `id` is open on `platform` and, when given, has
    /// type `session_type`. The `multi` platform matches any session.
    #[must_use]
    pub fn check_exist(&self, id: SessionId, platform: &str, session_type: Option<&str>) -> bool {
        self.state.lock().sessions.get(&id).is_some_and(|entry| {
            let summary = &entry.summary;
            entry.liveness.is_alive()
                && (platform.eq_ignore_ascii_case("multi")
                    || summary.platform.eq_ignore_ascii_case(platform))
                && session_type.is_none_or(|kind| summary.session_type.eq_ignore_ascii_case(kind))
        })
    }

    /// Summary of one session.
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<SessionSummary> {
        self.state
            .lock()
            .sessions
            .get(&id)
            .map(|entry| entry.summary.clone())
    }

    /// Open sessions in id order.
    #[must_use]
    pub fn list(&self) -> Vec<SessionSummary> {
        self.state
            .lock()
            .sessions
            .values()
            .filter(|entry| entry.liveness.is_alive())
            .map(|entry| entry.summary.clone())
            .collect()
    }

    /// Closes one session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for unknown ids.
    pub fn close(&self, id: SessionId) -> Result<(), SessionError> {
        let entry = self
            .state
            .lock()
            .sessions
            .shift_remove(&id)
            .ok_or(SessionError::NotFound { id })?;
        entry.liveness.close();
        info!(target: SESSIONS_TARGET, session = %id, "session closed");
        Ok(())
    }

    /// Closes every session.
    pub fn close_all(&self) {
        let drained: Vec<SessionEntry> = self
            .state
            .lock()
            .sessions
            .drain(..)
            .map(|(_, entry)| entry)
            .collect();
        for entry in drained {
            entry.liveness.close();
        }
    }

    /// Drops sessions whose peer has gone away, returning their ids.
    pub fn close_dead(&self) -> Vec<SessionId> {
        let mut state = self.state.lock();
        let dead: Vec<SessionId> = state
            .sessions
            .iter()
            .filter(|(_, entry)| !entry.liveness.is_alive())
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            state.sessions.shift_remove(id);
            info!(target: SESSIONS_TARGET, session = %id, "session terminated");
        }
        dead
    }

    /// Returns `true` when at least one session is open.
    #[must_use]
    pub fn has_open(&self) -> bool {
        self.state
            .lock()
            .sessions
            .values()
            .any(|entry| entry.liveness.is_alive())
    }
}
