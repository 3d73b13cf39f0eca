//! Tools the model can call, and the registry that dispatches them.

mod error;
mod object;
mod registry;

use giaic_model::ToolCallId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::{Error, ErrorKind, RegistryError};
pub use registry::Registry;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Arguments sent by the model are decoded into [`Tool::Input`] before
/// [`Tool::execute`] is called, so handlers only ever see well-formed input.
/// The schema returned by [`Tool::parameter_schema`] should describe that
/// same type; deriving both from one struct (for example with `schemars`)
/// keeps them in sync.
///
/// Implementations should be stateless. Any context they need (a lookup
/// table, a base directory) is fixed at construction.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool. Names are unique within a registry.
    fn name(&self) -> &str;

    /// Returns the description shown to the model.
    fn description(&self) -> &str;

    /// Returns the JSON schema of the input object.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// A tool call made while answering one user message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The id the model gave to the call.
    pub call_id: ToolCallId,
    /// The tool that was called.
    pub name: String,
    /// The arguments as sent by the model.
    pub arguments: Value,
    /// The text handed back to the model. For a failed call this is the
    /// error description.
    pub result: String,
    /// Whether the call failed.
    pub failed: bool,
}
