//! The invocation loop implementation.

use std::sync::Arc;
use std::time::Duration;
use handback_config::InvocationConfig;
use handback_core::client::{AgentClient, InvokeInlineAgentRequest};
use handback_core::definition::{AgentDefinition, DefinitionLookup};
use handback_core::error::{Error, Result};
use handback_core::function::{ErrorHandler, FunctionInvoker};
use handback_core::session::{OutputBuffer, ReturnControlBatch, SessionId};
use tracing::{debug, info, warn};
use crate::dispatch::FunctionDispatcher;
use crate::schema::resolve_action_groups;
use crate::turn::drain_turn;

/// Everything one invocation produced.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    /// The session the turns ran in (generated if none was given)
    pub session_id: SessionId,

    /// The agent's final answer: every chunk of every turn, in order
    pub text: String,

    /// Number of turns sent to the agent service
    pub turns: u32,

    /// Number of local function calls answered
    pub function_calls: usize,
}

/// Drives inline-agent invocations through the return-control protocol.
///
/// The client, definitions and function invoker are shared and read-only;
/// each call to [`invoke`](Self::invoke) owns its own session id, output
/// buffer and pending batch, so concurrent invocations do not interact.
pub struct InlineAgentInvoker {
    /// The remote agent service
    client: Arc<dyn AgentClient>,

    /// Agent and action-group definitions
    definitions: Arc<dyn DefinitionLookup>,

    /// Local function execution and error policy
    dispatcher: FunctionDispatcher,

    /// Model for agents that do not configure one
    default_model: Option<String>,

    /// Maximum turns per invocation
    max_turns: Option<u32>,

    /// Deadline for a whole invocation
    timeout: Option<Duration>,
}

impl InlineAgentInvoker {
    /// Create a new invoker. Function failures are fatal until an error
    /// handler is attached.
    pub fn new(
        client: Arc<dyn AgentClient>,
        definitions: Arc<dyn DefinitionLookup>,
        invoker: Arc<dyn FunctionInvoker>,
    ) -> Self {
        Self {
            client,
            definitions,
            dispatcher: FunctionDispatcher::new(invoker),
            default_model: None,
            max_turns: None,
            timeout: None,
        }
    }

    /// Map function failures into results instead of aborting.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.dispatcher = self.dispatcher.with_error_handler(handler);
        self
    }

    /// Set the model used when an agent does not configure one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the maximum number of turns per invocation.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = Some(max);
        self
    }

    /// Abandon an invocation that has not finished within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply the `[invocation]` config section.
    pub fn with_settings(mut self, settings: &InvocationConfig) -> Self {
        if let Some(model) = &settings.default_model {
            self.default_model = Some(model.clone());
        }
        if let Some(max) = settings.max_turns {
            self.max_turns = Some(max);
        }
        if let Some(secs) = settings.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Run an agent on `input_text` and return its final answer.
    ///
    /// A fresh session id is generated when `session_id` is `None`.
    pub async fn invoke(
        &self,
        agent_name: &str,
        session_id: Option<SessionId>,
        input_text: &str,
    ) -> Result<String> {
        self.invoke_detailed(agent_name, session_id, input_text)
            .await
            .map(|outcome| outcome.text)
    }

    /// Like [`invoke`](Self::invoke), but also reports the session and turn counts.
    pub async fn invoke_detailed(
        &self,
        agent_name: &str,
        session_id: Option<SessionId>,
        input_text: &str,
    ) -> Result<InvocationOutcome> {
        let run = self.run(agent_name, session_id, input_text);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                warn!(agent = agent_name, timeout_secs = limit.as_secs(), "Invocation timed out");
                Error::Timeout {
                    timeout_secs: limit.as_secs(),
                }
            })?,
            None => run.await,
        }
    }

    /// Pick the model for this invocation.
    ///
    /// The agent's own model always wins; the default only fills in when the
    /// agent has none. Nothing else (in particular, not the input) is ever
    /// used as a model id.
    fn resolve_model(&self, agent: &AgentDefinition) -> Result<String> {
        let configured = agent
            .foundation_model
            .as_deref()
            .filter(|m| !m.trim().is_empty());

        configured
            .or(self.default_model.as_deref())
            .map(str::to_string)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "agent '{}' has no foundation model and no default model is configured",
                    agent.name
                ),
            })
    }

    async fn run(
        &self,
        agent_name: &str,
        session_id: Option<SessionId>,
        input_text: &str,
    ) -> Result<InvocationOutcome> {
        // ── Resolution (before any network call) ──
        let agent = self
            .definitions
            .agent(agent_name)
            .ok_or_else(|| Error::AgentNotFound(agent_name.to_string()))?;
        let action_groups = resolve_action_groups(self.definitions.as_ref(), &agent)?;
        let model = self.resolve_model(&agent)?;
        let session_id = session_id.unwrap_or_default();

        info!(
            agent = %agent.name,
            session_id = %session_id,
            model = %model,
            action_groups = action_groups.len(),
            client = %self.client.name(),
            "Starting inline agent invocation"
        );

        let mut pending: Option<ReturnControlBatch> = None;
        let mut output = OutputBuffer::new();
        let mut turns: u32 = 0;
        let mut function_calls = 0;

        loop {
            if let Some(limit) = self.max_turns {
                if turns >= limit {
                    warn!(
                        session_id = %session_id,
                        turns,
                        "Turn limit reached with a return-control batch still pending"
                    );
                    return Err(Error::TurnLimitExceeded {
                        limit,
                        session_id: session_id.to_string(),
                    });
                }
            }
            turns += 1;

            // Input goes out on the first turn only; later turns answer the pending batch.
            let (input, inline_session_state) = match pending.take() {
                Some(batch) => (None, Some(batch.into_session_state())),
                None => (Some(input_text.to_string()), None),
            };

            debug!(
                session_id = %session_id,
                turn = turns,
                invocation_id = inline_session_state.as_ref().map(|s| s.invocation_id.as_str()),
                "Sending turn"
            );

            let request = InvokeInlineAgentRequest {
                foundation_model: model.clone(),
                instruction: agent.instruction.clone(),
                action_groups: action_groups.clone(),
                session_id: session_id.clone(),
                input_text: input,
                inline_session_state,
            };

            let events = self.client.invoke_inline_agent(request).await?;
            let outcome = drain_turn(events, &self.dispatcher, &mut output).await?;
            function_calls += outcome.function_calls;
            debug!(
                session_id = %session_id,
                turn = turns,
                chunks = outcome.chunks,
                pending = outcome.pending.is_some(),
                "Turn complete"
            );

            match outcome.pending {
                Some(batch) => pending = Some(batch),
                None => break,
            }
        }

        let text = output.into_string();
        info!(
            session_id = %session_id,
            turns,
            function_calls,
            chars = text.chars().count(),
            "Invocation complete"
        );

        Ok(InvocationOutcome {
            session_id,
            text,
            turns,
            function_calls,
        })
    }
}
