//! The `registry` module is the single source of truth for which subscribers
//! are currently listening.
//!
//! It maps a subscriber name to the private delivery channel its websocket
//! connection drains. Registration and removal take exclusive access; lookups
//! on the publish path take shared access.

pub mod subscribers;

pub use subscribers::{SubscriberHandle, SubscriberRegistry};

#[cfg(test)]
mod tests;
