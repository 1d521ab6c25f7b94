//! Server-sent-event decoding for the inline-agent response stream.
//!
//! Each `data:` line carries one JSON object keyed by event kind:
//!
//! ```text
//! data: {"chunk":{"bytes":"SGVsbG8="}}
//! data: {"returnControl":{"invocationId":"...","invocationInputs":[...]}}
//! data: {"trace":{...}}
//! data: [DONE]
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use handback_core::client::{AgentEvent, ReturnControlPayload};
use handback_core::error::TransportError;
use handback_core::function::FunctionInvocationRequest;
use serde::Deserialize;

/// What one `data:` payload decodes to.
#[derive(Debug, PartialEq)]
pub enum Decoded {
    /// An event for the loop
    Event(AgentEvent),
    /// A valid event the loop does not consume (traces, metadata)
    Ignored,
    /// End-of-response marker
    Done,
}

/// Decode the payload of one `data:` line.
pub fn decode_data(data: &str) -> Result<Decoded, TransportError> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Decoded::Done);
    }

    let event: WireEvent = serde_json::from_str(data)
        .map_err(|e| TransportError::InvalidEvent(format!("{e}: {data}")))?;

    if let Some(error) = event.error {
        return Err(TransportError::ServiceError(error.message));
    }

    if let Some(chunk) = event.chunk {
        let bytes = STANDARD
            .decode(chunk.bytes.as_bytes())
            .map_err(|e| TransportError::InvalidEvent(format!("chunk is not base64: {e}")))?;
        return Ok(Decoded::Event(AgentEvent::Chunk { bytes }));
    }

    if let Some(payload) = event.return_control {
        let invocation_inputs = payload
            .invocation_inputs
            .into_iter()
            .map(|input| {
                input.function_invocation_input.ok_or_else(|| {
                    TransportError::InvalidEvent(
                        "return-control input without functionInvocationInput".into(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(Decoded::Event(AgentEvent::ReturnControl(
            ReturnControlPayload {
                invocation_id: payload.invocation_id,
                invocation_inputs,
            },
        )));
    }

    Ok(Decoded::Ignored)
}

/// Splits a byte stream into lines.
///
/// Network chunks may end mid-line (or mid-character), so bytes are held
/// until a newline arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every line they complete, without terminators.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line[..end]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        lines
    }
}

/// Extract the payload of a `data:` line. Other SSE fields and comments yield `None`.
pub fn data_field(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

// --- Wire types (internal) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    #[serde(default)]
    chunk: Option<WireChunk>,
    #[serde(default)]
    return_control: Option<WireReturnControl>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    bytes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReturnControl {
    invocation_id: String,
    #[serde(default)]
    invocation_inputs: Vec<WireInvocationInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInvocationInput {
    #[serde(default)]
    function_invocation_input: Option<FunctionInvocationRequest>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}
