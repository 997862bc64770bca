//! The `transport` module is the HTTP/websocket shell around the relays.
//!
//! It defines the wire types, the axum router, and the per-connection
//! delivery loop that drains a subscriber's channel onto its websocket.

pub mod http;
pub mod message;
pub mod websocket;

#[cfg(test)]
mod tests;
