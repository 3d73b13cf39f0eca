//! Core logic of the assistant: tools, conversations, the model/tool loop,
//! sessions and answer streaming.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod model_client;
pub mod orchestrator;
pub mod session;
pub mod stream;
pub mod tool;

pub use conversation::{Conversation, Role, Turn};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, TurnOutcome};
pub use session::{SessionError, SessionId, SessionStore};
pub use stream::{TurnEvent, TurnStream};
pub use tool::{Registry, Tool, ToolResult};
