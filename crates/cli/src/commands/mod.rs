pub mod agents;
pub mod functions;
pub mod invoke;
pub mod schema;

use std::path::Path;
use handback_config::AppConfig;
use handback_core::definition::DefinitionRegistry;
use handback_core::function::FunctionRegistry;

/// Load config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Configured definitions plus the built-in action groups.
///
/// A configured action group shadows a built-in one of the same name.
pub fn definitions(config: &AppConfig, functions: &FunctionRegistry) -> DefinitionRegistry {
    let mut registry = config.definitions();
    for group in handback_functions::builtin_action_groups(functions) {
        registry.register_action_group_if_absent(group);
    }
    registry
}
