//! # Handback Core
//!
//! Domain types, traits, and error definitions for the Handback return-control
//! agent loop. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the loop is defined as a trait here:
//! - [`AgentClient`]: the streamed connection to the remote agent service
//! - [`FunctionInvoker`] / [`ErrorHandler`]: local function execution
//! - [`DefinitionLookup`]: agent and action-group resolution
//!
//! Implementations live in their respective crates, so the loop can be
//! driven by scripted stubs in tests and by the HTTP client in production.

pub mod client;
pub mod definition;
pub mod error;
pub mod function;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use client::{
    AgentActionGroup, AgentClient, AgentEvent, EventReceiver, InlineSessionState,
    InvokeInlineAgentRequest, ReturnControlPayload,
};
pub use definition::{
    ActionGroupDefinition, AgentDefinition, DefinitionLookup, DefinitionRegistry, FunctionSpec,
    ParameterSpec, ParameterType,
};
pub use error::{Error, FunctionError, Result, TransportError};
pub use function::{
    ErrorHandler, FunctionInvocationRequest, FunctionInvoker, FunctionParameter, FunctionRegistry,
    FunctionResult, LocalFunction, ResponseState, invoker_fn,
};
pub use session::{OutputBuffer, ReturnControlBatch, SessionId};
