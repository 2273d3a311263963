//! SessionRegistry: independent "create analysis" sessions
//!
//! Each session exclusively owns its construction state. Starting a
//! generation copies that state into a ticket; closing a session cancels
//! whatever run it has in flight.

use super::orchestrator::{GenerationError, GenerationOrchestrator, GenerationOutcome};
use super::readiness::check_readiness;
use crate::model::ConstructionState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identifier for a construction session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Session {
    state: ConstructionState,
    /// Token of the run started from this session, if one is in flight
    run: Option<CancellationToken>,
}

/// A construction snapshot cleared to run
#[derive(Debug)]
pub struct GenerationTicket {
    pub session_id: SessionId,
    pub snapshot: ConstructionState,
    pub cancel: CancellationToken,
}

/// Frees a session's run slot however the run ends, including when the
/// generating future is dropped.
struct RunSlot<'a> {
    sessions: &'a DashMap<SessionId, Session>,
    id: SessionId,
}

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        if let Some(mut session) = self.sessions.get_mut(&self.id) {
            session.run = None;
        }
    }
}

/// Registry of open construction sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open a session with an empty construction state
    pub fn open(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, Session::default());
        debug!(session = %id, "construction session opened");
        id
    }

    /// Apply an edit to a session's state.
    ///
    /// Edits made while a run is in flight never reach that run.
    pub fn edit<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut ConstructionState) -> R,
    ) -> Option<R> {
        self.sessions.get_mut(id).map(|mut s| f(&mut s.state))
    }

    /// A copy of a session's current state
    pub fn state(&self, id: &SessionId) -> Option<ConstructionState> {
        self.sessions.get(id).map(|s| s.state.clone())
    }

    pub fn is_running(&self, id: &SessionId) -> bool {
        self.sessions
            .get(id)
            .map(|s| s.run.is_some())
            .unwrap_or(false)
    }

    /// Snapshot a ready session for generation.
    ///
    /// Refused while the state fails readiness or a run is already in flight.
    pub fn begin_generation(&self, id: &SessionId) -> Result<GenerationTicket, GenerationError> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| GenerationError::SessionNotFound(id.to_string()))?;
        if session.run.is_some() {
            return Err(GenerationError::AlreadyRunning(id.to_string()));
        }
        check_readiness(&session.state)?;

        let cancel = CancellationToken::new();
        session.run = Some(cancel.clone());
        Ok(GenerationTicket {
            session_id: *id,
            snapshot: session.state.clone(),
            cancel,
        })
    }

    /// Begin, run and settle a generation for `id`.
    ///
    /// The session is consumed when the run completes. An abandoned run
    /// leaves the session (if still open) editable again.
    pub async fn generate(
        &self,
        id: &SessionId,
        orchestrator: &GenerationOrchestrator,
    ) -> Result<GenerationOutcome, GenerationError> {
        let ticket = self.begin_generation(id)?;
        let _slot = RunSlot {
            sessions: &self.sessions,
            id: *id,
        };
        let result = orchestrator.run(ticket.snapshot, &ticket.cancel).await;

        if let Ok(GenerationOutcome::Completed(analysis)) = &result {
            self.sessions.remove(id);
            info!(session = %id, analysis = %analysis.id, "session consumed by generation");
        }
        result
    }

    /// Tear a session down, cancelling its in-flight run.
    ///
    /// Returns whether the session existed.
    pub fn close(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                if let Some(cancel) = session.run {
                    cancel.cancel();
                    info!(session = %id, "session closed mid-generation");
                }
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }
}
