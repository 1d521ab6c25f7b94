//! Error policies: what happens when a local function fails.
//!
//! By default no handler is installed and a failing function aborts the
//! invocation. [`ReportFailure`] instead sends the error back to the agent as
//! a `FAILURE` result so the conversation can continue.

use handback_config::FunctionErrorPolicy;
use handback_core::error::FunctionError;
use handback_core::function::{ErrorHandler, FunctionInvocationRequest, FunctionResult};
use std::sync::Arc;

/// Maps any function error into an error-shaped result carrying its message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFailure;

impl ErrorHandler for ReportFailure {
    fn handle(&self, request: &FunctionInvocationRequest, error: &FunctionError) -> FunctionResult {
        FunctionResult::failure(request, format!("Error: {error}"))
    }
}

/// The error handler a configured policy installs, if any.
pub fn error_handler_for(policy: FunctionErrorPolicy) -> Option<Arc<dyn ErrorHandler>> {
    match policy {
        FunctionErrorPolicy::Abort => None,
        FunctionErrorPolicy::Report => Some(Arc::new(ReportFailure)),
    }
}
