//! `handback invoke`: run an agent on one message.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use handback_agent::InlineAgentInvoker;
use handback_client::HttpAgentClient;
use handback_core::session::SessionId;
use handback_functions::{default_registry, error_handler_for};

pub async fn run(
    config_path: Option<&Path>,
    agent: &str,
    session: Option<String>,
    timeout: Option<u64>,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let functions = default_registry();
    let definitions = super::definitions(&config, &functions);
    let client = HttpAgentClient::from_config(&config.client)?;

    let mut invoker = InlineAgentInvoker::new(
        Arc::new(client),
        Arc::new(definitions),
        Arc::new(functions),
    )
    .with_settings(&config.invocation);

    if let Some(handler) = error_handler_for(config.invocation.on_function_error) {
        invoker = invoker.with_error_handler(handler);
    }
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err("--timeout must be greater than zero".into());
        }
        invoker = invoker.with_timeout(Duration::from_secs(secs));
    }

    let session_id = session.map(|s| SessionId::from(s.as_str()));
    let outcome = invoker.invoke_detailed(agent, session_id, message).await?;

    tracing::debug!(
        session_id = %outcome.session_id,
        turns = outcome.turns,
        function_calls = outcome.function_calls,
        "Invocation finished"
    );
    println!("{}", outcome.text);

    Ok(())
}
