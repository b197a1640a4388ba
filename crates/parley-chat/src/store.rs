//! In-memory conversation history keyed by session id.
//!
//! The outer map is only write-locked to create a session. Each session's
//! turn list has its own mutex, so different sessions never contend and
//! concurrent appends to one session serialize without losing turns.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::ChatError;
use crate::types::{ConversationSummary, Turn};

type Session = Arc<Mutex<Vec<Turn>>>;

#[derive(Default)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's turns, oldest first. Unknown sessions are empty.
    pub fn get(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        let Some(session) = self.session(session_id)? else {
            return Ok(Vec::new());
        };
        let turns = session
            .lock()
            .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))?;
        Ok(turns.clone())
    }

    /// Append one turn, creating the session if needed.
    pub fn append(&self, session_id: &str, turn: Turn) -> Result<usize, ChatError> {
        self.append_all(session_id, [turn])
    }

    /// Append a user turn and its answer as one step, so no other writer's
    /// turns can land between them. Returns the session's new turn count.
    pub fn append_exchange(
        &self,
        session_id: &str,
        user: Turn,
        assistant: Turn,
    ) -> Result<usize, ChatError> {
        self.append_all(session_id, [user, assistant])
    }

    /// Snapshot of every session's history, keyed by session id.
    pub fn list(&self) -> Result<BTreeMap<String, Vec<Turn>>, ChatError> {
        self.sessions_snapshot()?
            .into_iter()
            .map(|(session_id, session)| {
                let turns = session
                    .lock()
                    .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))?;
                Ok((session_id, turns.clone()))
            })
            .collect()
    }

    /// Summaries of every known session, ordered by session id.
    pub fn summaries(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let mut summaries = self
            .sessions_snapshot()?
            .into_iter()
            .map(|(session_id, session)| {
                let turns = session
                    .lock()
                    .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))?;
                Ok(ConversationSummary {
                    session_id,
                    turn_count: turns.len(),
                    last_activity: turns.last().map(|t| t.timestamp),
                })
            })
            .collect::<Result<Vec<_>, ChatError>>()?;
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(summaries)
    }

    pub fn turn_count(&self, session_id: &str) -> Result<usize, ChatError> {
        match self.session(session_id)? {
            Some(session) => Ok(session
                .lock()
                .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))?
                .len()),
            None => Ok(0),
        }
    }

    /// Number of sessions with at least one stored turn.
    pub fn session_count(&self) -> Result<usize, ChatError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| ChatError::Internal(format!("store lock poisoned: {}", e)))?
            .len())
    }

    /// Clone the session handles so no session lock is taken under the map lock.
    fn sessions_snapshot(&self) -> Result<Vec<(String, Session)>, ChatError> {
        let map = self
            .sessions
            .read()
            .map_err(|e| ChatError::Internal(format!("store lock poisoned: {}", e)))?;
        Ok(map
            .iter()
            .map(|(id, session)| (id.clone(), Arc::clone(session)))
            .collect())
    }

    fn session(&self, session_id: &str) -> Result<Option<Session>, ChatError> {
        let map = self
            .sessions
            .read()
            .map_err(|e| ChatError::Internal(format!("store lock poisoned: {}", e)))?;
        Ok(map.get(session_id).cloned())
    }

    fn session_or_insert(&self, session_id: &str) -> Result<Session, ChatError> {
        if let Some(session) = self.session(session_id)? {
            return Ok(session);
        }
        let mut map = self
            .sessions
            .write()
            .map_err(|e| ChatError::Internal(format!("store lock poisoned: {}", e)))?;
        let session = map.entry(session_id.to_string()).or_default();
        Ok(Arc::clone(session))
    }

    fn append_all<I>(&self, session_id: &str, new_turns: I) -> Result<usize, ChatError>
    where
        I: IntoIterator<Item = Turn>,
    {
        let session = self.session_or_insert(session_id)?;
        let mut turns = session
            .lock()
            .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))?;
        turns.extend(new_turns);
        tracing::trace!(session_id, turn_count = turns.len(), "Conversation updated");
        Ok(turns.len())
    }
}
