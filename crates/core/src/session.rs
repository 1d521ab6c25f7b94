//! Session bookkeeping for one invocation.
//!
//! An invocation owns three pieces of state: a stable [`SessionId`], an
//! [`OutputBuffer`] of generated text, and at most one pending
//! [`ReturnControlBatch`] waiting to be sent on the next turn.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::client::{InlineSessionState, InvocationResultMember};
use crate::function::{FunctionInvocationRequest, FunctionResult};

/// Unique identifier for a session. Opaque to the loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

/// A fully answered return-control event.
///
/// Every request has its result, in the order the service issued the
/// requests. Only complete batches are ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnControlBatch {
    pub invocation_id: String,
    pub entries: Vec<(FunctionInvocationRequest, FunctionResult)>,
}

impl ReturnControlBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the session state that carries these results into the next turn.
    pub fn into_session_state(self) -> InlineSessionState {
        InlineSessionState {
            invocation_id: self.invocation_id,
            return_control_invocation_results: self
                .entries
                .into_iter()
                .map(|(_, function_result)| InvocationResultMember { function_result })
                .collect(),
        }
    }
}

/// Append-only buffer of generated text.
///
/// Bytes are kept raw and decoded once at the end, so a multi-byte character
/// split across two chunks still decodes correctly.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the buffer. Invalid sequences become U+FFFD.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}
