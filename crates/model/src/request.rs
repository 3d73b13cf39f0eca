use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpaqueMessage;

/// One round trip's worth of input for the model.
///
/// # Message order
///
/// `messages` is the conversation as the model should read it, oldest
/// first:
///
/// 1. at most one [`ModelMessage::System`], and only at the front;
/// 2. the session's user and assistant turns, in the order they happened;
/// 3. for each tool round of the current turn, the model's own message
///    (usually [`ModelMessage::Opaque`]) followed by one
///    [`ModelMessage::Tool`] per requested call, in the order the calls
///    were requested.
///
/// Every [`ToolCallResult`] answers a call made in the message right before
/// its group, so providers can replay the pair without reordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The conversation, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools the model may call, in a stable order.
    pub tools: Vec<ModelTool>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The assistant's standing instructions.
    System(String),
    /// Something the user typed.
    User(String),
    /// A recorded answer, replayed as plain text.
    Assistant(String),
    /// The outcome of one tool call.
    Tool(ToolCallResult),
    /// A message produced by the provider itself, replayed verbatim. Only
    /// the provider that made it can read it.
    Opaque(OpaqueMessage),
}

/// The id a model gives to one tool call.
///
/// The same id links the call, its result, and any [`ToolCallResult`]
/// stored with the conversation. Providers that do not send ids must make
/// up ones that are unique within the response.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ToolCallId(String);

impl ToolCallId {
    /// Wraps a raw id.
    #[inline]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ToolCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ToolCallId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ToolCallId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl PartialEq<str> for ToolCallId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ToolCallId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The answer to one tool call.
///
/// A failed call still gets a result: its content describes the failure so
/// the model can recover.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The call this result answers.
    pub id: ToolCallId,
    /// The tool's text, or a description of why it failed.
    pub content: String,
}

impl ToolCallResult {
    /// Creates a result for the call `id`.
    #[inline]
    pub fn new<I: Into<ToolCallId>, S: Into<String>>(id: I, content: S) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// A tool as advertised to the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// The name the model calls the tool by.
    pub name: String,
    /// Tells the model when the tool is useful.
    pub description: String,
    /// JSON schema of the arguments object. The model's arguments are
    /// decoded against the same shape before the tool runs.
    pub parameters: Value,
}
