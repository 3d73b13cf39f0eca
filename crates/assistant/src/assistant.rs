use giaic_core::session::{SessionError, SessionId, SessionStore};
use giaic_core::stream::TurnStream;
use giaic_core::tool::RegistryError;
use giaic_core::{OrchestratorBuilder, Turn};
use giaic_model::ModelProvider;
use giaic_openai_model::OpenAIProvider;

use crate::config::AssistantConfig;
use crate::tools::default_registry;

/// The name the assistant presents itself with.
pub const AGENT_NAME: &str = "GIAIC Assistant";

/// The instructions sent to the model as the system message.
pub const INSTRUCTIONS: &str = "You are a helpful assistant that can answer questions about GIAIC students and their activities and can provide weather information.";

/// The greeting shown when a chat starts.
pub const WELCOME_MESSAGE: &str =
    "Welcome to GIAIC Assistant! How can I assist you today?";

/// An assistant builder.
///
/// See [`Assistant`].
pub struct AssistantBuilder {
    orchestrator_builder: OrchestratorBuilder,
}

impl AssistantBuilder {
    /// Creates an assistant builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let orchestrator_builder =
            OrchestratorBuilder::with_model_provider(provider)
                .with_system_prompt(INSTRUCTIONS);
        Self {
            orchestrator_builder,
        }
    }

    /// Creates an assistant builder backed by the OpenAI-compatible
    /// endpoint described by `config`.
    pub fn with_config(config: &AssistantConfig) -> Self {
        let provider = OpenAIProvider::new(config.model().clone());
        Self::with_model_provider(provider)
            .with_max_tool_rounds(config.max_tool_rounds())
    }

    /// Replaces the default instructions.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.orchestrator_builder =
            self.orchestrator_builder.with_system_prompt(prompt);
        self
    }

    /// Sets how many tool-call rounds one turn may take.
    #[inline]
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.orchestrator_builder =
            self.orchestrator_builder.with_max_tool_rounds(max_tool_rounds);
        self
    }

    /// Builds the assistant with the built-in tools.
    pub fn build(self) -> Result<Assistant, RegistryError> {
        let tools = default_registry()?;
        let orchestrator = self
            .orchestrator_builder
            .with_tools(tools.into())
            .build();
        debug!(
            "assistant ready, tools: {:?}",
            orchestrator.tools().names().collect::<Vec<_>>()
        );
        Ok(Assistant {
            sessions: SessionStore::new(orchestrator),
        })
    }
}

/// The assistant, serving any number of independent chat sessions.
///
/// Cloning is cheap; clones serve the same sessions.
#[derive(Clone)]
pub struct Assistant {
    sessions: SessionStore,
}

impl Assistant {
    /// Returns the greeting to show when a chat starts.
    #[inline]
    pub fn welcome_message(&self) -> &'static str {
        WELCOME_MESSAGE
    }

    /// Starts a new chat session.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[inline]
    pub fn start_session(&self) -> SessionId {
        self.sessions.start_session()
    }

    /// Sends a user message to a session and returns the answer stream.
    #[inline]
    pub fn send_message<S: Into<String>>(
        &self,
        id: &SessionId,
        text: S,
    ) -> Result<TurnStream, SessionError> {
        self.sessions.send_message(id, text)
    }

    /// Returns a copy of a session's conversation.
    #[inline]
    pub async fn transcript(
        &self,
        id: &SessionId,
    ) -> Result<Vec<Turn>, SessionError> {
        self.sessions.transcript(id).await
    }

    /// Ends a session, discarding its conversation.
    #[inline]
    pub fn end_session(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.end_session(id)
    }

    /// Returns the underlying session store.
    #[inline]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use giaic_model::{ModelMessage, ToolCallRequest};
    use giaic_test_model::{PresetEvent, PresetResponse, TestModelProvider};
    use serde_json::json;

    use super::*;

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: id.into(),
            name: name.to_owned(),
            arguments,
        })
    }

    fn tool_result(messages: &[ModelMessage]) -> Option<&str> {
        messages.iter().find_map(|msg| match msg {
            ModelMessage::Tool(result) => Some(result.content.as_str()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_weather_question() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([call(
            "call_0",
            "get_weather",
            json!({ "location": "Karachi" }),
        )]));
        model_provider.add_response(PresetResponse::with_text([
            "It is sunny in Karachi, ",
            "25°C.",
        ]));
        let assistant =
            AssistantBuilder::with_model_provider(model_provider.clone())
                .build()
                .unwrap();

        let id = assistant.start_session();
        let stream = assistant
            .send_message(&id, "What's the weather in Karachi?")
            .unwrap();
        assert_eq!(
            stream.collect_text().await.unwrap(),
            "It is sunny in Karachi, 25°C."
        );

        let requests = model_provider.requests();
        assert_eq!(
            requests[0].messages[0],
            ModelMessage::System(INSTRUCTIONS.to_owned())
        );
        let tools = requests[0]
            .tools
            .iter()
            .map(|tool| tool.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(tools, ["get_weather", "giaic_student_finder"]);
        assert_eq!(
            tool_result(&requests[1].messages),
            Some("The weather in Karachi is sunny with a temperature of 25°C.")
        );
        assert_eq!(assistant.transcript(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_student_question() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_events([call(
            "call_0",
            "giaic_student_finder",
            json!({ "name": "Ali Khan" }),
        )]));
        model_provider.add_response(PresetResponse::with_text([
            "Ali Khan is not a GIAIC student.",
        ]));
        let assistant =
            AssistantBuilder::with_model_provider(model_provider.clone())
                .build()
                .unwrap();

        let id = assistant.start_session();
        let answer = assistant
            .send_message(&id, "Is Ali Khan a student?")
            .unwrap()
            .collect_text()
            .await;
        assert_eq!(answer.unwrap(), "Ali Khan is not a GIAIC student.");
        assert_eq!(
            tool_result(&model_provider.requests()[1].messages),
            Some("Student Ali Khan not a student of GIAIC.")
        );

        assistant.end_session(&id).unwrap();
        assert_eq!(
            assistant.end_session(&id),
            Err(SessionError::UnknownSession(id))
        );
    }
}
