//! The model/tool loop that answers one user message.

mod builder;
mod error;

use std::sync::Arc;

use giaic_model::{ModelMessage, ModelRequest, ToolCallResult};

pub use builder::{DEFAULT_MAX_TOOL_ROUNDS, OrchestratorBuilder};
pub use error::Error;

use crate::conversation::Turn;
use crate::model_client::ModelClient;
use crate::stream::Emitter;
use crate::tool::{ErrorKind as ToolErrorKind, Registry, ToolInvocation};

/// What a successful turn produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The assistant's answer: every fragment emitted during the turn, in
    /// order.
    pub turn: Turn,
    /// The tool calls made while answering, in the order they ran.
    pub invocations: Vec<ToolInvocation>,
}

/// Runs the model/tool loop for one user message at a time.
///
/// The orchestrator holds no per-session state, so one instance serves
/// every session of the process.
pub struct Orchestrator {
    model_client: ModelClient,
    tools: Arc<Registry>,
    system_prompt: Option<String>,
    max_tool_rounds: usize,
}

impl Orchestrator {
    /// Returns the identifier of the model answering the turns.
    #[inline]
    pub fn model_id(&self) -> &str {
        self.model_client.model_id()
    }

    /// Returns the configured tool-call round bound.
    #[inline]
    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Returns the tools offered to the model.
    #[inline]
    pub fn tools(&self) -> &Registry {
        &self.tools
    }

    /// Answers the last user message of `transcript`.
    ///
    /// Text is emitted on `emitter` as the model produces it. When the model
    /// requests tools, they run one after another in the requested order,
    /// their results are added to a working copy of the transcript, and the
    /// model is asked again. `transcript` itself is never modified.
    ///
    /// The emitter is not terminated; that is left to the caller, which
    /// knows whether the outcome could be recorded.
    pub async fn run(
        &self,
        transcript: &[Turn],
        emitter: &Emitter,
    ) -> Result<TurnOutcome, Error> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(ModelMessage::System(system_prompt.clone()));
        }
        messages.extend(transcript.iter().map(Turn::to_model_message));
        let tools = self.tools.definitions();

        let mut answer = String::new();
        let mut invocations = Vec::new();
        let mut rounds = 0;

        loop {
            if emitter.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let request = ModelRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let resp = self
                .model_client
                .send_request(request, emitter.fragment_sink())
                .await
                .map_err(Error::from_provider)?;
            answer.push_str(&resp.transcript);

            if resp.tool_calls.is_empty() {
                debug!(
                    "answered after {rounds} tool rounds, {} bytes",
                    answer.len()
                );
                return Ok(TurnOutcome {
                    turn: Turn::assistant(answer),
                    invocations,
                });
            }
            if rounds >= self.max_tool_rounds {
                warn!("model still requests tools after {rounds} rounds");
                return Err(Error::ToolLoopExceeded(self.max_tool_rounds));
            }
            rounds += 1;

            messages.push(match resp.opaque_msg {
                Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
                None => ModelMessage::Assistant(resp.transcript),
            });

            for call in resp.tool_calls {
                if emitter.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let result =
                    self.tools.invoke(&call.name, call.arguments.clone()).await;
                let (content, failed) = match result {
                    Ok(content) => (content, false),
                    Err(err) if err.kind() == ToolErrorKind::UnknownTool => {
                        return Err(Error::UnknownTool(call.name));
                    }
                    // Let the model see the failure and recover from it.
                    Err(err) => (format!("Error: {err}"), true),
                };
                messages.push(ModelMessage::Tool(ToolCallResult::new(
                    call.id.clone(),
                    content.clone(),
                )));
                invocations.push(ToolInvocation {
                    call_id: call.id,
                    name: call.name,
                    arguments: call.arguments,
                    result: content,
                    failed,
                });
            }
        }
    }
}
