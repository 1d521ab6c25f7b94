//! Draining one turn's event stream.

use handback_core::client::{AgentEvent, EventReceiver};
use handback_core::error::{Error, Result};
use handback_core::session::{OutputBuffer, ReturnControlBatch};
use tracing::{debug, trace};
use crate::dispatch::FunctionDispatcher;

/// What a completed turn left behind.
#[derive(Debug)]
pub(crate) struct TurnOutcome {
    /// The answered batch to send on the next turn, if the agent asked for functions
    pub pending: Option<ReturnControlBatch>,
    pub chunks: usize,
    pub function_calls: usize,
}

/// Consume events until the stream ends.
///
/// Chunks are appended in arrival order. A return-control event is resolved
/// as soon as it arrives; a second one in the same turn breaks the
/// single-pending-batch protocol and fails the turn.
pub(crate) async fn drain_turn(
    mut events: EventReceiver,
    dispatcher: &FunctionDispatcher,
    output: &mut OutputBuffer,
) -> Result<TurnOutcome> {
    let mut pending: Option<ReturnControlBatch> = None;
    let mut chunks = 0;

    while let Some(event) = events.recv().await {
        match event? {
            AgentEvent::Chunk { bytes } => {
                trace!(len = bytes.len(), "Chunk received");
                output.append(&bytes);
                chunks += 1;
            }
            AgentEvent::ReturnControl(payload) => {
                if let Some(existing) = &pending {
                    return Err(Error::Protocol(format!(
                        "return-control event {} arrived while {} is still pending",
                        payload.invocation_id, existing.invocation_id
                    )));
                }
                pending = Some(dispatcher.resolve_batch(payload).await?);
            }
        }
    }

    let function_calls = pending.as_ref().map_or(0, ReturnControlBatch::len);
    debug!(chunks, function_calls, "Turn stream completed");

    Ok(TurnOutcome {
        pending,
        chunks,
        function_calls,
    })
}
