use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use super::worker::{Command, Worker};
use super::{SessionError, SessionId};
use crate::conversation::Turn;
use crate::orchestrator::Orchestrator;
use crate::stream::{self, TurnStream};

/// A handle to the set of live sessions.
///
/// Clones share the same sessions. All sessions share one
/// [`Orchestrator`]; each keeps its own conversation.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    orchestrator: Arc<Orchestrator>,
    sessions: Mutex<HashMap<SessionId, Worker>>,
}

impl SessionStore {
    /// Creates an empty store whose sessions are answered by
    /// `orchestrator`.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            inner: Arc::new(Inner {
                orchestrator: Arc::new(orchestrator),
                sessions: Mutex::default(),
            }),
        }
    }

    /// Returns the orchestrator shared by all sessions.
    #[inline]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    /// Starts a session with an empty conversation.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start_session(&self) -> SessionId {
        let id = SessionId::new();
        let worker = Worker::spawn(id, Arc::clone(&self.inner.orchestrator));
        self.sessions().insert(id, worker);
        info!("session started: {id}");
        id
    }

    /// Sends a user message and returns the stream of the answer.
    ///
    /// If a turn is already running in the session, the message waits for
    /// it and every message before it. Dropping the returned stream
    /// cancels the turn; nothing is recorded for a cancelled turn.
    pub fn send_message<S: Into<String>>(
        &self,
        id: &SessionId,
        text: S,
    ) -> Result<TurnStream, SessionError> {
        let (emitter, stream) = stream::channel();
        let cmd = Command::Message {
            text: text.into(),
            emitter,
        };
        self.send_command(id, cmd)?;
        Ok(stream)
    }

    /// Returns a copy of the session's conversation.
    ///
    /// The copy is taken once every message sent before this call has been
    /// answered.
    pub async fn transcript(
        &self,
        id: &SessionId,
    ) -> Result<Vec<Turn>, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send_command(id, Command::Transcript(reply_tx))?;
        reply_rx.await.map_err(|_| SessionError::UnknownSession(*id))
    }

    /// Ends a session and discards its conversation.
    ///
    /// A turn still in progress fails; queued messages are dropped.
    pub fn end_session(&self, id: &SessionId) -> Result<(), SessionError> {
        match self.sessions().remove(id) {
            Some(_) => {
                info!("session ended: {id}");
                Ok(())
            }
            None => Err(SessionError::UnknownSession(*id)),
        }
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Returns `true` if no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    fn send_command(
        &self,
        id: &SessionId,
        cmd: Command,
    ) -> Result<(), SessionError> {
        let sessions = self.sessions();
        let Some(worker) = sessions.get(id) else {
            return Err(SessionError::UnknownSession(*id));
        };
        worker
            .send(cmd)
            .map_err(|_| SessionError::UnknownSession(*id))
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Worker>> {
        // The map stays consistent even if a holder panicked.
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
