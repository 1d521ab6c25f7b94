//! The return-control orchestration loop: the heart of Handback.
//!
//! One invocation is a sequence of **turns** against the remote agent:
//!
//! 1. **Resolve** the agent and its action groups (fail fast if missing)
//! 2. **Send** a turn: the user's input on the first turn, the answered
//!    return-control batch on every later turn
//! 3. **Drain** the turn's stream: text chunks go to the output buffer,
//!    a return-control event is answered locally through the dispatcher
//! 4. **If a batch is pending**: loop back to step 2
//! 5. **Otherwise**: return the accumulated text
//!
//! Turns never overlap, and at most one batch is ever pending.

pub mod dispatch;
pub mod invoker;
pub mod schema;
mod turn;

#[cfg(test)]
mod test_helpers;

pub use dispatch::FunctionDispatcher;
pub use invoker::{InlineAgentInvoker, InvocationOutcome};
pub use schema::{build_action_group, resolve_action_groups};
