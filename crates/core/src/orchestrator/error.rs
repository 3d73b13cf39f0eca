use giaic_model::{ErrorKind as ModelErrorKind, ModelProviderError};

/// Why a turn failed.
///
/// Tool failures that the model can recover from never show up here; they
/// are handed back to the model as tool results instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The model asked for a tool that is not registered.
    #[error("the model requested an unknown tool: {0}")]
    UnknownTool(String),

    /// The model kept requesting tools past the configured bound.
    #[error("tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),

    /// The model backend failed. Not retried.
    #[error("model backend failed ({kind}): {message}")]
    BackendUnavailable {
        /// What the provider reported.
        kind: ModelErrorKind,
        /// The provider's error message.
        message: String,
    },

    /// The caller stopped listening before the turn completed.
    #[error("the turn was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn from_provider(err: Box<dyn ModelProviderError>) -> Self {
        Error::BackendUnavailable {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Returns the text shown to the user in place of an answer.
    pub fn user_message(&self) -> String {
        match self {
            Error::UnknownTool(name) => {
                format!("⚠️ The assistant tried to use a tool that does not exist ({name}).")
            }
            Error::ToolLoopExceeded(_) => {
                "⚠️ The assistant could not finish answering. Please try a simpler question."
                    .to_owned()
            }
            Error::BackendUnavailable {
                kind: ModelErrorKind::RateLimitExceeded,
                ..
            } => "⚠️ Too many requests right now. Please wait a moment.".to_owned(),
            Error::BackendUnavailable {
                kind: ModelErrorKind::Moderated,
                ..
            } => "⚠️ The answer was blocked by the model's content filter.".to_owned(),
            Error::BackendUnavailable { .. } => {
                "⚠️ The assistant is unavailable right now. Please try again later."
                    .to_owned()
            }
            Error::Cancelled => "⚠️ The answer was cancelled.".to_owned(),
        }
    }
}
