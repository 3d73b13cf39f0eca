//! Delivery of a turn's answer to the caller, fragment by fragment.
//!
//! Each turn gets its own channel: the turn task holds the [`Emitter`] and
//! the caller holds the [`TurnStream`]. Every stream ends with exactly one
//! terminal event, [`TurnEvent::Done`] or [`TurnEvent::Failed`], even when
//! the answer is empty.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

const ABORTED_MESSAGE: &str = "The turn was aborted before it completed.";

/// An event on a [`TurnStream`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The next piece of the answer.
    Fragment(String),
    /// The turn failed; carries a message meant for the user. Terminal.
    Failed(String),
    /// The answer is complete. Terminal.
    Done,
}

impl TurnEvent {
    /// Returns `true` for [`TurnEvent::Done`] and [`TurnEvent::Failed`].
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnEvent::Fragment(_))
    }
}

/// Creates a connected emitter/stream pair.
pub fn channel() -> (Emitter, TurnStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Emitter { tx },
        TurnStream {
            rx,
            terminated: false,
        },
    )
}

/// The producing half of a turn's stream.
///
/// Terminating consumes the emitter, so nothing can follow the terminal
/// event.
#[derive(Debug)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl Emitter {
    /// Sends a fragment. Empty fragments are skipped.
    ///
    /// Returns `false` if the caller has dropped the stream.
    pub fn emit<S: Into<String>>(&self, fragment: S) -> bool {
        let fragment = fragment.into();
        if fragment.is_empty() {
            return !self.tx.is_closed();
        }
        self.tx.send(TurnEvent::Fragment(fragment)).is_ok()
    }

    /// Returns `true` once the caller has dropped the stream.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    /// Completes when the caller drops the stream.
    #[inline]
    pub async fn cancelled(&self) {
        self.tx.closed().await
    }

    /// Ends the stream successfully.
    #[inline]
    pub fn finish(self) {
        self.tx.send(TurnEvent::Done).ok();
    }

    /// Ends the stream with a failure message.
    #[inline]
    pub fn fail<S: Into<String>>(self, message: S) {
        self.tx.send(TurnEvent::Failed(message.into())).ok();
    }

    /// Returns a callback that emits fragments on this stream.
    ///
    /// The callback must be dropped before the emitter terminates the
    /// stream, so that no fragment can follow the terminal event.
    pub(crate) fn fragment_sink(&self) -> impl Fn(String) + Send + 'static {
        let tx = self.tx.clone();
        move |fragment| {
            if !fragment.is_empty() {
                tx.send(TurnEvent::Fragment(fragment)).ok();
            }
        }
    }
}

/// The consuming half of a turn's stream.
///
/// Dropping it cancels the turn.
#[derive(Debug)]
pub struct TurnStream {
    rx: mpsc::UnboundedReceiver<TurnEvent>,
    terminated: bool,
}

impl TurnStream {
    /// Receives the next event, or `None` after the terminal event.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        std::future::poll_fn(|cx| self.poll_event(cx)).await
    }

    /// Reads the whole stream, returning the concatenated fragments or the
    /// failure message.
    pub async fn collect_text(mut self) -> Result<String, String> {
        let mut text = String::new();
        while let Some(event) = self.next_event().await {
            match event {
                TurnEvent::Fragment(fragment) => text.push_str(&fragment),
                TurnEvent::Failed(message) => return Err(message),
                TurnEvent::Done => break,
            }
        }
        Ok(text)
    }

    fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<TurnEvent>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        let event = match self.rx.poll_recv(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Some(event)) => event,
            // The producer went away without saying why.
            Poll::Ready(None) => TurnEvent::Failed(ABORTED_MESSAGE.to_owned()),
        };
        if event.is_terminal() {
            self.terminated = true;
            self.rx.close();
        }
        Poll::Ready(Some(event))
    }
}

impl Stream for TurnStream {
    type Item = TurnEvent;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_event(cx)
    }
}
