//! Function invocation: the local side of the return-control protocol.
//!
//! When the remote agent wants a function called, it hands control back with
//! a [`FunctionInvocationRequest`]. A [`FunctionInvoker`] turns that into a
//! [`FunctionResult`]; if invocation fails, an optional [`ErrorHandler`] may
//! map the failure into a result instead of aborting the conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use crate::definition::{ActionGroupDefinition, FunctionSpec};
use crate::error::FunctionError;

/// Content type key used for plain-text response bodies.
pub const TEXT_CONTENT: &str = "TEXT";

/// A function call requested by the remote agent mid-stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocationRequest {
    /// The action group that owns the function
    pub action_group: String,

    /// The function name
    pub function: String,

    /// Arguments, in the order the service sent them
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
}

/// One argument of a function call. Values always arrive as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    pub value: String,
}

impl FunctionInvocationRequest {
    pub fn new(action_group: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            action_group: action_group.into(),
            function: function.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters.push(FunctionParameter {
            name: name.into(),
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    /// Raw string value of a named argument.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Structured view of the arguments as a JSON object.
    ///
    /// Values are coerced according to their declared type; a value that does
    /// not parse as its declared type is kept as a string.
    pub fn arguments(&self) -> serde_json::Map<String, serde_json::Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), coerce_value(&p.kind, &p.value)))
            .collect()
    }
}

fn coerce_value(kind: &str, raw: &str) -> serde_json::Value {
    use serde_json::Value;

    let parsed = match kind {
        "integer" => raw.trim().parse::<i64>().ok().map(Value::from),
        "number" => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "boolean" => raw.trim().parse::<bool>().ok().map(Value::Bool),
        "array" => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_array),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// The outcome of a local function call, sent back to the agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    pub action_group: String,

    pub function: String,

    /// Content type → body
    pub response_body: BTreeMap<String, ContentBody>,

    /// Set for error-shaped results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_state: Option<ResponseState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBody {
    pub body: String,
}

/// Tells the agent how to treat a result that is not a plain success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseState {
    /// The function failed; the agent should not retry it blindly
    Failure,
}

impl FunctionResult {
    /// A successful result with a plain-text body.
    pub fn success(request: &FunctionInvocationRequest, body: impl Into<String>) -> Self {
        Self::with_body(request, body.into(), None)
    }

    /// An error-shaped result.
    pub fn failure(request: &FunctionInvocationRequest, message: impl Into<String>) -> Self {
        Self::with_body(request, message.into(), Some(ResponseState::Failure))
    }

    fn with_body(
        request: &FunctionInvocationRequest,
        body: String,
        response_state: Option<ResponseState>,
    ) -> Self {
        let mut response_body = BTreeMap::new();
        response_body.insert(TEXT_CONTENT.to_string(), ContentBody { body });
        Self {
            action_group: request.action_group.clone(),
            function: request.function.clone(),
            response_body,
            response_state,
        }
    }

    /// The plain-text body, if any.
    pub fn text(&self) -> Option<&str> {
        self.response_body.get(TEXT_CONTENT).map(|c| c.body.as_str())
    }

    pub fn is_failure(&self) -> bool {
        self.response_state == Some(ResponseState::Failure)
    }
}

/// Executes function calls requested by the remote agent.
///
/// Shared across invocations and called re-entrantly; implementations must
/// not rely on per-invocation state.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(
        &self,
        request: &FunctionInvocationRequest,
    ) -> std::result::Result<FunctionResult, FunctionError>;
}

/// Maps a failed function call into a result the conversation can continue with.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, request: &FunctionInvocationRequest, error: &FunctionError) -> FunctionResult;
}

impl<F> ErrorHandler for F
where
    F: Fn(&FunctionInvocationRequest, &FunctionError) -> FunctionResult + Send + Sync,
{
    fn handle(&self, request: &FunctionInvocationRequest, error: &FunctionError) -> FunctionResult {
        self(request, error)
    }
}

/// A [`FunctionInvoker`] backed by an async closure. See [`invoker_fn`].
pub struct FnInvoker<F>(F);

/// Wrap an async closure as a [`FunctionInvoker`].
pub fn invoker_fn<F, Fut>(f: F) -> FnInvoker<F>
where
    F: Fn(FunctionInvocationRequest) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<FunctionResult, FunctionError>> + Send,
{
    FnInvoker(f)
}

#[async_trait]
impl<F, Fut> FunctionInvoker for FnInvoker<F>
where
    F: Fn(FunctionInvocationRequest) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<FunctionResult, FunctionError>> + Send,
{
    async fn invoke(
        &self,
        request: &FunctionInvocationRequest,
    ) -> std::result::Result<FunctionResult, FunctionError> {
        (self.0)(request.clone()).await
    }
}

/// A function implemented in-process.
///
/// Each built-in function implements this trait and is registered in a
/// [`FunctionRegistry`], which the loop uses as its invoker.
#[async_trait]
pub trait LocalFunction: Send + Sync {
    /// The action group this function belongs to.
    fn action_group(&self) -> &str;

    /// The function name as exposed to the agent (e.g., "getDate").
    fn name(&self) -> &str;

    /// Description and parameter schema (sent to the agent).
    fn spec(&self) -> FunctionSpec;

    async fn call(
        &self,
        request: &FunctionInvocationRequest,
    ) -> std::result::Result<FunctionResult, FunctionError>;
}

/// A registry of local functions keyed by `(action_group, function)`.
pub struct FunctionRegistry {
    functions: BTreeMap<(String, String), Box<dyn LocalFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Register a function. Replaces any existing function with the same key.
    pub fn register(&mut self, function: Box<dyn LocalFunction>) {
        let key = (
            function.action_group().to_string(),
            function.name().to_string(),
        );
        self.functions.insert(key, function);
    }

    pub fn get(&self, action_group: &str, function: &str) -> Option<&dyn LocalFunction> {
        self.functions
            .get(&(action_group.to_string(), function.to_string()))
            .map(|f| f.as_ref())
    }

    /// Build an action-group definition from every function registered under `name`.
    ///
    /// Returns `None` when no function belongs to the group.
    pub fn action_group_definition(
        &self,
        name: &str,
        description: &str,
    ) -> Option<ActionGroupDefinition> {
        let functions: BTreeMap<String, FunctionSpec> = self
            .functions
            .iter()
            .filter(|((group, _), _)| group == name)
            .map(|((_, function), f)| (function.clone(), f.spec()))
            .collect();

        if functions.is_empty() {
            return None;
        }

        Some(ActionGroupDefinition {
            name: name.to_string(),
            description: description.to_string(),
            functions,
        })
    }

    /// List all registered `(action_group, function)` pairs.
    pub fn names(&self) -> Vec<(&str, &str)> {
        self.functions
            .keys()
            .map(|(g, f)| (g.as_str(), f.as_str()))
            .collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionInvoker for FunctionRegistry {
    async fn invoke(
        &self,
        request: &FunctionInvocationRequest,
    ) -> std::result::Result<FunctionResult, FunctionError> {
        let function = self
            .get(&request.action_group, &request.function)
            .ok_or_else(|| FunctionError::NotFound {
                action_group: request.action_group.clone(),
                function: request.function.clone(),
            })?;
        function.call(request).await
    }
}
