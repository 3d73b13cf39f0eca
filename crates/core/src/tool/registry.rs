use std::collections::HashMap;
use std::sync::Arc;

use giaic_model::ModelTool;
use serde_json::Value;
use tracing::Instrument;

use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, RegistryError, Tool, ToolResult};

/// The set of tools offered to the model.
///
/// A registry is filled once at startup and then shared read-only between
/// sessions, typically behind an `Arc`.
#[derive(Default)]
pub struct Registry {
    // Registration order is kept so tool definitions are sent to the model
    // in a stable order.
    tools: Vec<Arc<dyn ToolObject>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, failing if its name is taken.
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_owned();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        debug!("registered tool: {name}");
        self.by_name.insert(name, self.tools.len());
        self.tools.push(Arc::new(ToolObjectImpl(tool)));
        Ok(())
    }

    /// Returns `true` if a tool named `name` is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Returns the definitions to include in a model request.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Invokes the tool `name` with the given arguments object.
    ///
    /// Fails with [`ErrorKind::UnknownTool`](super::ErrorKind::UnknownTool)
    /// if no such tool exists, with
    /// [`ErrorKind::InvalidArguments`](super::ErrorKind::InvalidArguments)
    /// if the arguments don't decode into the tool's input, and otherwise
    /// returns whatever the tool returns.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let Some(&idx) = self.by_name.get(name) else {
            warn!("tool not found: {name}");
            return Err(Error::unknown_tool(name));
        };
        trace!("invoking {name} with args: {arguments}");
        let result = self.tools[idx]
            .execute(arguments)
            .instrument(debug_span!("tool invoke", tool = name))
            .await;
        if let Err(err) = &result {
            debug!("tool {name} failed: {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::tool::ErrorKind;

    static ECHO_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
        #[serde(default)]
        shout: bool,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeats the text"
        }

        fn parameter_schema(&self) -> &Value {
            ECHO_SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(if input.text.is_empty() {
                Err(Error::execution_error().with_reason("nothing to echo"))
            } else if input.shout {
                Ok(input.text.to_uppercase())
            } else {
                Ok(input.text)
            })
        }
    }

    struct NamedTool(&'static str);

    impl Tool for NamedTool {
        type Input = Value;

        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "A tool with a configurable name"
        }

        fn parameter_schema(&self) -> &Value {
            ECHO_SCHEMA
        }

        fn execute(
            &self,
            _input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(String::new()))
        }
    }

    #[test]
    fn test_register() {
        let mut registry = Registry::new();
        registry.register(NamedTool("b")).unwrap();
        registry.register(EchoTool).unwrap();
        registry.register(NamedTool("a")).unwrap();

        assert_eq!(
            registry.register(NamedTool("echo")),
            Err(RegistryError::DuplicateTool("echo".to_owned()))
        );
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("echo"));
        assert!(registry.names().eq(["b", "echo", "a"]));

        let definitions = registry.definitions();
        assert_eq!(definitions[1].name, "echo");
        assert_eq!(definitions[1].description, "Repeats the text");
    }

    #[tokio::test]
    async fn test_invoke() {
        let mut registry = Registry::new();
        registry.register(EchoTool).unwrap();

        let result = registry.invoke("echo", json!({ "text": "salam" })).await;
        assert_eq!(result.unwrap(), "salam");

        let result = registry
            .invoke("echo", json!({ "text": "salam", "shout": true }))
            .await;
        assert_eq!(result.unwrap(), "SALAM");

        let err = registry
            .invoke("echo", json!({ "text": "" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.reason(), "nothing to echo");
    }

    #[tokio::test]
    async fn test_invoke_rejections() {
        let mut registry = Registry::new();
        registry.register(EchoTool).unwrap();

        let err = registry
            .invoke("echo", json!({ "text": 42 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = registry.invoke("echo", Value::Null).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = registry
            .invoke("read_file", json!({ "text": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
    }
}
