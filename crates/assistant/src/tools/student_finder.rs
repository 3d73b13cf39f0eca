use std::collections::HashMap;
use std::future::ready;

use giaic_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const STUDENTS: [(&str, &str); 2] = [
    ("Subhan Kaladi", "Subhan is a student of GIAIC."),
    ("Shahid Ali", "Shahid is a student of GIAIC."),
];

/// Arguments of the student finder, as sent by the model.
#[derive(Deserialize, JsonSchema)]
pub struct GiaicStudentFinderParameters {
    #[schemars(description = "Full name of the student, e.g. `Shahid Ali`.")]
    name: String,
}

/// A tool that looks a student up in the GIAIC directory.
///
/// Names must match exactly.
pub struct GiaicStudentFinderTool {
    students: HashMap<&'static str, &'static str>,
    parameter_schema: Value,
}

impl GiaicStudentFinderTool {
    /// Creates a student finder over the built-in directory.
    pub fn new() -> Self {
        GiaicStudentFinderTool {
            students: HashMap::from(STUDENTS),
            parameter_schema: schema_for!(GiaicStudentFinderParameters)
                .to_value(),
        }
    }
}

impl Default for GiaicStudentFinderTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GiaicStudentFinderTool {
    type Input = GiaicStudentFinderParameters;

    fn name(&self) -> &str {
        "giaic_student_finder"
    }

    fn description(&self) -> &str {
        "Finds a student by name in the GIAIC database."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let found = match self.students.get(input.name.as_str()) {
            Some(info) => (*info).to_owned(),
            None => format!("Student {} not a student of GIAIC.", input.name),
        };
        ready(Ok(found))
    }
}
