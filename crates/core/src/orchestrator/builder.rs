use std::sync::Arc;

use giaic_model::ModelProvider;

use super::Orchestrator;
use crate::model_client::ModelClient;
use crate::tool::Registry;

/// The tool-call round bound used when none is configured.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// [`Orchestrator`] builder.
pub struct OrchestratorBuilder {
    model_client: ModelClient,
    tools: Arc<Registry>,
    system_prompt: Option<String>,
    max_tool_rounds: usize,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: Arc::new(Registry::new()),
            system_prompt: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Sets the instructions sent as the system message of every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the tools offered to the model.
    #[inline]
    pub fn with_tools(mut self, tools: Arc<Registry>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets how many tool-call rounds one turn may take.
    #[inline]
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Builds the orchestrator.
    #[inline]
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            model_client: self.model_client,
            tools: self.tools,
            system_prompt: self.system_prompt,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}
