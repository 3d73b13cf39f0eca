//! The tools offered to the model.

mod student_finder;
mod weather;

use giaic_core::tool::{Registry, RegistryError};

pub use student_finder::GiaicStudentFinderTool;
pub use weather::GetWeatherTool;

/// Creates a registry holding every built-in tool.
pub fn default_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.register(GetWeatherTool::new())?;
    registry.register(GiaicStudentFinderTool::new())?;
    Ok(registry)
}
