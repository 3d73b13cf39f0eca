//! The protocol between the assistant and a chat model backend.
//!
//! The orchestrator only talks to models through the traits in this crate,
//! so a hosted backend and the scripted test backend are interchangeable.
//!
//! One user turn is a sequence of [`ModelRequest`]s. Each request replays
//! the whole conversation so far. When a response asks for tools, the next
//! request appends the model's own message (as an [`OpaqueMessage`] only its
//! provider can read) and then one [`ToolCallResult`] per call, matched by
//! [`ToolCallId`]. The turn ends with the first response that asks for no
//! tools.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::ErrorKind;
pub use opaque::OpaqueMessage;
pub use provider::{ModelProvider, ModelProviderError};
pub use request::{
    ModelMessage, ModelRequest, ModelTool, ToolCallId, ToolCallResult,
};
pub use response::{
    ModelFinishReason, ModelResponse, ModelResponseEvent, ToolCallRequest,
};
