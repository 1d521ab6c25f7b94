//! AgentClient trait: the abstraction over the remote inline-agent service.
//!
//! A client opens one streamed exchange per turn: it sends the agent
//! definition, the session id and either the user's input or the results of
//! the previous return-control batch, and hands back a channel of events.
//!
//! This module also holds the wire-level request schema. Field names follow
//! the service's camelCase JSON, so clients can serialize it directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::definition::ParameterType;
use crate::error::TransportError;
use crate::function::{FunctionInvocationRequest, FunctionResult};
use crate::session::SessionId;

/// One turn of an inline-agent conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeInlineAgentRequest {
    /// The foundation model to run the agent on
    pub foundation_model: String,

    /// The agent's instruction
    pub instruction: String,

    /// Action groups the agent may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_groups: Vec<AgentActionGroup>,

    /// Session the turn belongs to (sent in the request path, not the body)
    #[serde(skip)]
    pub session_id: SessionId,

    /// User input; only present on the first turn of an invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,

    /// Results of the previous return-control batch; only present on later turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_session_state: Option<InlineSessionState>,
}

/// Wire schema of an action group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActionGroup {
    pub action_group_name: String,

    #[serde(default)]
    pub description: String,

    pub action_group_executor: ActionGroupExecutor,

    pub function_schema: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionGroupExecutor {
    pub custom_control: CustomControlMethod,
}

impl ActionGroupExecutor {
    /// Hand every function call back to the caller.
    pub fn return_control() -> Self {
        Self {
            custom_control: CustomControlMethod::ReturnControl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomControlMethod {
    ReturnControl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub functions: Vec<FunctionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDetail {
    #[serde(rename = "type")]
    pub kind: ParameterType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,
}

/// Session state carried into the next turn: the answered return-control batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineSessionState {
    pub invocation_id: String,

    pub return_control_invocation_results: Vec<InvocationResultMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResultMember {
    pub function_result: FunctionResult,
}

/// A return-control event: the agent wants these functions called.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnControlPayload {
    pub invocation_id: String,

    /// Requests in the order the service issued them
    pub invocation_inputs: Vec<FunctionInvocationRequest>,
}

/// An event delivered on a turn's stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Generated text, as raw UTF-8 bytes
    Chunk { bytes: Vec<u8> },

    /// The agent hands control back for function calls
    ReturnControl(ReturnControlPayload),
}

impl AgentEvent {
    /// A chunk event carrying `text`.
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Chunk {
            bytes: text.as_ref().as_bytes().to_vec(),
        }
    }
}

/// Receiving half of a turn's event stream. The turn is complete when the
/// sender side is dropped.
pub type EventReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<AgentEvent, TransportError>>;

/// The core AgentClient trait.
///
/// Implementations must be re-entrant: the loop shares one client across
/// every invocation and never calls it concurrently within one invocation.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// A human-readable name for this client (e.g., "http").
    fn name(&self) -> &str;

    /// Open one streamed turn.
    async fn invoke_inline_agent(
        &self,
        request: InvokeInlineAgentRequest,
    ) -> std::result::Result<EventReceiver, TransportError>;
}
