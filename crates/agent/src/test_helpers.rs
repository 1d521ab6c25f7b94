//! Shared test helpers: a scripted agent client and a recording invoker.

use async_trait::async_trait;
use handback_core::client::{
    AgentClient, AgentEvent, EventReceiver, InvokeInlineAgentRequest, ReturnControlPayload,
};
use handback_core::error::{FunctionError, TransportError};
use handback_core::function::{FunctionInvocationRequest, FunctionInvoker, FunctionResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One scripted turn.
pub enum ScriptedTurn {
    /// The stream delivers these events, then completes
    Events(Vec<Result<AgentEvent, TransportError>>),
    /// Opening the turn fails
    Fail(TransportError),
    /// The stream never completes
    Hang,
}

/// An agent client that plays back scripted turns and records every request.
///
/// Returns an API error if more turns are requested than were scripted.
pub struct ScriptedClient {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<InvokeInlineAgentRequest>>,
    held: Mutex<Vec<mpsc::Sender<Result<AgentEvent, TransportError>>>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// A client whose turns each deliver the given events.
    pub fn with_turns(turns: Vec<Vec<AgentEvent>>) -> Self {
        Self::new(
            turns
                .into_iter()
                .map(|events| ScriptedTurn::Events(events.into_iter().map(Ok).collect()))
                .collect(),
        )
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<InvokeInlineAgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke_inline_agent(
        &self,
        request: InvokeInlineAgentRequest,
    ) -> Result<EventReceiver, TransportError> {
        self.requests.lock().unwrap().push(request);
        let turn = self.turns.lock().unwrap().pop_front();

        match turn {
            Some(ScriptedTurn::Events(scripted)) => Ok(events(scripted)),
            Some(ScriptedTurn::Fail(error)) => Err(error),
            Some(ScriptedTurn::Hang) => {
                let (tx, rx) = mpsc::channel(1);
                self.held.lock().unwrap().push(tx);
                Ok(rx)
            }
            None => Err(TransportError::ApiError {
                status_code: 500,
                message: "ScriptedClient: no more turns".into(),
            }),
        }
    }
}

/// A completed event stream holding `scripted`.
pub fn events(scripted: Vec<Result<AgentEvent, TransportError>>) -> EventReceiver {
    let (tx, rx) = mpsc::channel(scripted.len().max(1));
    for event in scripted {
        tx.try_send(event).expect("channel sized for script");
    }
    rx
}

/// A return-control event asking for `functions` in the `tools` action group.
pub fn return_control(invocation_id: &str, functions: &[&str]) -> AgentEvent {
    return_control_in("tools", invocation_id, functions)
}

pub fn return_control_in(action_group: &str, invocation_id: &str, functions: &[&str]) -> AgentEvent {
    AgentEvent::ReturnControl(ReturnControlPayload {
        invocation_id: invocation_id.to_string(),
        invocation_inputs: functions
            .iter()
            .map(|f| FunctionInvocationRequest::new(action_group, *f))
            .collect(),
    })
}

enum Answer {
    Fixed(String),
    FunctionName,
}

/// A function invoker that records calls and answers from a fixed rule.
pub struct RecordingInvoker {
    answer: Answer,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingInvoker {
    /// Every call succeeds with `text`.
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Answer::Fixed(text.to_string()),
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the called function's name.
    pub fn echoing_function_name() -> Self {
        Self {
            answer: Answer::FunctionName,
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls to `function` fail.
    pub fn failing_on(mut self, function: &str) -> Self {
        self.failing.push(function.to_string());
        self
    }

    /// Names of the functions called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FunctionInvoker for RecordingInvoker {
    async fn invoke(
        &self,
        request: &FunctionInvocationRequest,
    ) -> Result<FunctionResult, FunctionError> {
        self.calls.lock().unwrap().push(request.function.clone());

        if self.failing.contains(&request.function) {
            return Err(FunctionError::ExecutionFailed {
                function: request.function.clone(),
                reason: "scripted failure".into(),
            });
        }

        let body = match &self.answer {
            Answer::Fixed(text) => text.clone(),
            Answer::FunctionName => request.function.clone(),
        };
        Ok(FunctionResult::success(request, body))
    }
}
