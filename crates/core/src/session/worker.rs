use std::sync::Arc;

use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

use super::SessionId;
use crate::conversation::{Conversation, Turn};
use crate::orchestrator::{Error, Orchestrator};
use crate::stream::Emitter;

const SESSION_ENDED_MESSAGE: &str = "⚠️ The session has ended.";

pub(super) enum Command {
    Message { text: String, emitter: Emitter },
    Transcript(oneshot::Sender<Vec<Turn>>),
}

/// The handle to a session's task. Dropping it stops the task, failing the
/// turn in progress.
pub(super) struct Worker {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: watch::Sender<bool>,
}

impl Worker {
    /// Spawns the task on the current Tokio runtime.
    pub fn spawn(id: SessionId, orchestrator: Arc<Orchestrator>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        tokio::spawn(
            run_worker(orchestrator, cmd_rx, kill_rx)
                .instrument(debug_span!("actor", session = %id)),
        );
        Self { cmd_tx, kill_tx }
    }

    /// Queues a command, giving it back if the task is gone.
    #[inline]
    pub fn send(&self, cmd: Command) -> Result<(), Command> {
        self.cmd_tx.send(cmd).map_err(|err| err.0)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.kill_tx.send_replace(true);
    }
}

async fn run_worker(
    orchestrator: Arc<Orchestrator>,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    let mut conversation = Conversation::new();
    loop {
        let cmd = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                cmd
            }
        };

        match cmd {
            Command::Transcript(reply_tx) => {
                reply_tx.send(conversation.snapshot()).ok();
            }
            Command::Message { text, emitter } => {
                let turn_span = info_span!("turn", n = conversation.len() / 2);
                let alive = run_turn(
                    &orchestrator,
                    &mut conversation,
                    text,
                    emitter,
                    &mut kill_rx,
                )
                .instrument(turn_span)
                .await;
                if !alive {
                    break;
                }
            }
        }
    }
    debug!("will terminate, {} turns recorded", conversation.len());
}

/// Runs one turn to its end. Returns `false` if the session was ended
/// while the turn was in progress.
async fn run_turn(
    orchestrator: &Orchestrator,
    conversation: &mut Conversation,
    text: String,
    emitter: Emitter,
    kill_rx: &mut watch::Receiver<bool>,
) -> bool {
    let user_turn = Turn::user(text);
    let mut transcript = conversation.snapshot();
    transcript.push(user_turn.clone());

    let result = select! {
        biased;

        _ = kill_rx.changed() => None,
        _ = emitter.cancelled() => Some(Err(Error::Cancelled)),
        result = orchestrator.run(&transcript, &emitter) => Some(result),
    };

    match result {
        None => {
            debug!("session ended mid-turn");
            emitter.fail(SESSION_ENDED_MESSAGE);
            false
        }
        Some(Ok(outcome)) => {
            debug!(
                "turn completed with {} tool calls",
                outcome.invocations.len()
            );
            // Both turns land together, and only once the answer is
            // complete.
            conversation.append(user_turn);
            conversation.append(outcome.turn);
            emitter.finish();
            true
        }
        Some(Err(Error::Cancelled)) => {
            debug!("turn cancelled by the caller");
            true
        }
        Some(Err(err)) => {
            warn!("turn failed: {err}");
            emitter.fail(err.user_message());
            true
        }
    }
}
