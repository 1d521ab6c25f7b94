//! `handback agents`: list configured agents.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    if config.agents.is_empty() {
        println!("No agents configured.");
        println!(
            "  Add an [agents.<name>] table to {}",
            config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| handback_config::AppConfig::config_dir().join("config.toml"))
                .display()
        );
        return Ok(());
    }

    let default_model = config.invocation.default_model.as_deref();
    println!("Agents");
    println!("======");
    for (name, agent) in &config.agents {
        let model = match (agent.foundation_model.as_deref(), default_model) {
            (Some(model), _) => model.to_string(),
            (None, Some(model)) => format!("{model} (default)"),
            (None, None) => "<none>".to_string(),
        };
        let groups: Vec<&str> = agent.action_groups.iter().map(String::as_str).collect();

        println!("  {name}");
        println!("    Model:          {model}");
        println!(
            "    Action groups:  {}",
            if groups.is_empty() { "-".to_string() } else { groups.join(", ") }
        );
    }

    Ok(())
}
