//! The `relay` module holds the message-routing core.
//!
//! `DirectRelay` hands a payload straight to a registered subscriber's
//! channel and requires publisher and subscriber to overlap in time.
//! `BrokerRelay` routes through a per-receiver topic on the external broker
//! instead, so a subscriber can connect after the publish.

pub mod broker;
pub mod direct;
pub mod message;
pub mod topic;

pub use broker::BrokerRelay;
pub use direct::DirectRelay;
pub use message::ChatMessage;
