use std::future::ready;

use giaic_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Arguments of the weather tool, as sent by the model.
#[derive(Deserialize, JsonSchema)]
pub struct GetWeatherParameters {
    #[schemars(description = "The city or place to report on.")]
    location: String,
    #[schemars(description = "`celsius` or `fahrenheit`.")]
    #[serde(default = "default_unit")]
    unit: String,
}

fn default_unit() -> String {
    "celsius".to_owned()
}

/// A tool that reports the weather for a location.
///
/// The readings are canned: every location is sunny.
pub struct GetWeatherTool {
    parameter_schema: Value,
}

impl GetWeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new() -> Self {
        GetWeatherTool {
            parameter_schema: schema_for!(GetWeatherParameters).to_value(),
        }
    }
}

impl Default for GetWeatherTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GetWeatherTool {
    type Input = GetWeatherParameters;

    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Gets the weather for a given location, returning a short description of the weather."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(report(&input.location, &input.unit)))
    }
}

fn report(location: &str, unit: &str) -> String {
    let temperature = match unit {
        "celsius" => "25°C",
        "fahrenheit" => "77°F",
        _ => {
            return format!(
                "Weather data for {location} is not available in {unit}."
            );
        }
    };
    format!(
        "The weather in {location} is sunny with a temperature of {temperature}."
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(arguments: Value) -> GetWeatherParameters {
        serde_json::from_value(arguments).unwrap()
    }

    #[tokio::test]
    async fn test_units() {
        let tool = GetWeatherTool::new();

        let result = tool.execute(input(json!({ "location": "Karachi" })));
        assert_eq!(
            result.await.unwrap(),
            "The weather in Karachi is sunny with a temperature of 25°C."
        );

        let result = tool.execute(input(json!({
            "location": "Lahore",
            "unit": "fahrenheit",
        })));
        assert_eq!(
            result.await.unwrap(),
            "The weather in Lahore is sunny with a temperature of 77°F."
        );

        let result = tool.execute(input(json!({
            "location": "Quetta",
            "unit": "kelvin",
        })));
        assert_eq!(
            result.await.unwrap(),
            "Weather data for Quetta is not available in kelvin."
        );
    }

    #[test]
    fn test_schema() {
        let tool = GetWeatherTool::new();
        let schema = tool.parameter_schema();
        assert_eq!(schema["required"], json!(["location"]));
        assert!(schema["properties"]["unit"].is_object());
        assert_eq!(
            schema["description"],
            "Arguments of the weather tool, as sent by the model."
        );
    }
}
