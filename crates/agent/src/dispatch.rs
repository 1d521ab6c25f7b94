//! Function dispatch: answering return-control events locally.

use std::sync::Arc;
use std::time::Instant;
use handback_core::client::ReturnControlPayload;
use handback_core::error::{Error, Result};
use handback_core::function::{
    ErrorHandler, FunctionInvocationRequest, FunctionInvoker, FunctionResult,
};
use handback_core::session::ReturnControlBatch;
use tracing::{debug, warn};

/// Routes function requests to the injected invoker and applies the error policy.
///
/// Without an error handler, a failing function is fatal to the invocation.
/// With one, the failure is mapped into a result and the conversation goes on.
#[derive(Clone)]
pub struct FunctionDispatcher {
    invoker: Arc<dyn FunctionInvoker>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl FunctionDispatcher {
    pub fn new(invoker: Arc<dyn FunctionInvoker>) -> Self {
        Self {
            invoker,
            error_handler: None,
        }
    }

    /// Opt in to mapping function failures into results.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }

    /// Resolve a single request into a result.
    pub async fn resolve(&self, request: &FunctionInvocationRequest) -> Result<FunctionResult> {
        let start = Instant::now();
        let outcome = self.invoker.invoke(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                debug!(
                    action_group = %request.action_group,
                    function = %request.function,
                    duration_ms,
                    "Function invoked"
                );
                Ok(result)
            }
            Err(error) => match &self.error_handler {
                Some(handler) => {
                    warn!(
                        action_group = %request.action_group,
                        function = %request.function,
                        error = %error,
                        "Function failed, reporting error result to agent"
                    );
                    Ok(handler.handle(request, &error))
                }
                None => {
                    warn!(
                        action_group = %request.action_group,
                        function = %request.function,
                        error = %error,
                        "Function failed with no error handler, aborting invocation"
                    );
                    Err(Error::Function(error))
                }
            },
        }
    }

    /// Resolve every request of a return-control event, in order.
    ///
    /// Requests run one after another; the first fatal failure stops the batch.
    pub async fn resolve_batch(&self, payload: ReturnControlPayload) -> Result<ReturnControlBatch> {
        debug!(
            invocation_id = %payload.invocation_id,
            requests = payload.invocation_inputs.len(),
            "Resolving return-control batch"
        );

        let mut entries = Vec::with_capacity(payload.invocation_inputs.len());
        for request in payload.invocation_inputs {
            let result = self.resolve(&request).await?;
            entries.push((request, result));
        }

        Ok(ReturnControlBatch {
            invocation_id: payload.invocation_id,
            entries,
        })
    }
}
