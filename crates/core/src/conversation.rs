//! Conversation-related types.

use std::fmt::{self, Display};

use giaic_model::{ModelMessage, ToolCallId, ToolCallResult};
use serde::{Deserialize, Serialize};

/// Who a turn is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the user.
    User,
    /// An answer produced by the model.
    Assistant,
    /// The result of a tool call.
    Tool,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One message in a conversation.
///
/// Turns have no setters: once built, a turn is never changed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<ToolCallId>,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// Creates a tool turn answering the call `tool_call_id`.
    #[inline]
    pub fn tool<I: Into<ToolCallId>, S: Into<String>>(
        tool_call_id: I,
        content: S,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns who this turn is attributed to.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the id of the tool call this turn answers, for tool turns.
    #[inline]
    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_ref().map(ToolCallId::as_str)
    }

    pub(crate) fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
            Role::Tool => ModelMessage::Tool(ToolCallResult::new(
                self.tool_call_id.clone().unwrap_or_default(),
                self.content.clone(),
            )),
        }
    }
}

/// The ordered, append-only transcript of one session.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn at the end of the transcript.
    #[inline]
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns a copy of the transcript as it is now.
    ///
    /// The copy does not see turns appended afterwards.
    #[inline]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turn has been appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates over the turns, oldest first.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
