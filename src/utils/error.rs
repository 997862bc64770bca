//! Error types shared by the publish and subscribe paths.
//!
//! Every error here is scoped to a single request or connection; nothing in
//! this module is fatal to the whole process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::pubsub::BrokerError;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The request was structurally valid JSON but semantically unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Direct relay only: the receiver has no live registration.
    #[error("receiver is not online")]
    NotFound,

    /// The delivery deadline elapsed before the subscriber accepted the
    /// message. The payload is dropped, not queued.
    #[error("delivery timed out")]
    Timeout,

    #[error("broker unavailable: {0}")]
    Broker(#[from] BrokerError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Broker(_) | Self::Serialization(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
