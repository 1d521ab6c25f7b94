//! `handback schema`: print the action groups an agent sends.

use std::path::Path;
use handback_agent::resolve_action_groups;
use handback_core::definition::DefinitionLookup;
use handback_core::error::Error;
use handback_functions::default_registry;

pub fn run(config_path: Option<&Path>, agent: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let definitions = super::definitions(&config, &default_registry());

    let definition = definitions
        .agent(agent)
        .ok_or_else(|| Error::AgentNotFound(agent.to_string()))?;
    let groups = resolve_action_groups(&definitions, &definition)?;

    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}
