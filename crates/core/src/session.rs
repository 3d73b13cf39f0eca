//! Sessions: one conversation per caller, each served by its own task.
//!
//! A [`SessionStore`] is an explicit, cloneable handle. Every session it
//! starts gets a worker task that owns the session's [`Conversation`] and
//! handles one message at a time, so turns of the same session never
//! overlap while different sessions run concurrently.
//!
//! [`Conversation`]: crate::conversation::Conversation

mod store;
#[cfg(test)]
mod tests;
mod worker;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::SessionStore;

/// Identifies a session within a [`SessionStore`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    #[inline]
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Errors returned by [`SessionStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session was never started, or has already ended.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}
