//! Remote agent client implementations for Handback.
//!
//! All clients implement the `handback_core::AgentClient` trait. The HTTP
//! client speaks JSON requests and server-sent-event responses; [`sse`]
//! holds the event decoding so it can be tested without a network.

pub mod http;
pub mod sse;

pub use http::HttpAgentClient;
