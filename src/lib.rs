//! # chatrelay
//!
//! `chatrelay` relays short chat-style messages from HTTP publishers to named
//! websocket subscribers. Two delivery strategies coexist: a direct in-process
//! handoff, where publisher and subscriber must be connected at the same time,
//! and a broker-backed path that decouples them through a durable per-receiver
//! topic, so a subscriber can connect after the message was published.
//!
//! ## Core Modules
//!
//! - `registry`: the in-memory map of currently listening subscribers.
//! - `relay`: the message-routing core, in its direct and broker-backed forms.
//! - `pubsub`: the broker-client seam and its redis-streams and in-memory
//!   implementations.
//! - `transport`: the HTTP/websocket shell around the relays.
//! - `config`: handles loading and managing server configuration.
//! - `utils`: shared utilities, such as error handling and logging setup.

pub mod config;
pub mod pubsub;
pub mod registry;
pub mod relay;
pub mod transport;
pub mod utils;
