//! The GIAIC Assistant: a chat assistant that answers questions about GIAIC
//! students and reports the weather.
//!
//! The crate includes a CLI for chatting in the terminal. It can also be
//! used as a library to serve the assistant from your own host app.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod assistant;
pub mod config;
pub mod tools;

pub use assistant::{
    AGENT_NAME, Assistant, AssistantBuilder, INSTRUCTIONS, WELCOME_MESSAGE,
};
pub use config::{AssistantConfig, AssistantConfigBuilder, ConfigError};

/// Re-exports of [`giaic_core`] crate.
pub mod core {
    pub use giaic_core::*;
}
