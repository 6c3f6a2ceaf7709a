/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Error types for the Live Agent session driver.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by outbound calls and published on the event bus.
///
/// The type is `Clone` because every error is broadcast to all subscribers
/// of the error sub-stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiveAgentError {
    /// A session-scoped call was attempted without a usable session: either
    /// no session was allocated yet, or the affinity token rotated and the
    /// resync has not completed. Nothing was sent.
    #[error("No Live Agent session is established. Allocate a session (or finish resync) first.")]
    SessionNotEstablished,

    /// HTTP 400: the JSON body could not be understood.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// HTTP 403: the session is not valid.
    #[error("Session refused as invalid: {0}")]
    InvalidSession(String),

    /// HTTP 404: unknown resource.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// HTTP 405: wrong method for the resource.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 409: usually a message acknowledged out of order.
    #[error("Sequence conflict: {0}")]
    SequenceConflict(String),

    /// HTTP 500.
    #[error("Live Agent server fault: {0}")]
    ServerFault(String),

    /// HTTP 503: the affinity token changed. Call
    /// [`ChatSession::resync`](crate::ChatSession::resync) before sending
    /// further sequenced calls.
    #[error("Affinity token rotated; the session must be resynced")]
    AffinityRotated,

    /// Any other non-success status.
    #[error("Unexpected status ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Connection, TLS or timeout failure below the HTTP layer.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A request body could not be encoded, or a success response body
    /// could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Invalid or incomplete client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session was ended locally and the call was abandoned.
    #[error("Session cancelled")]
    Cancelled,
}

impl LiveAgentError {
    /// Map a non-2xx status code and its body to an error kind.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => LiveAgentError::MalformedRequest(body),
            403 => LiveAgentError::InvalidSession(body),
            404 => LiveAgentError::NotFound(body),
            405 => LiveAgentError::MethodNotAllowed(body),
            409 => LiveAgentError::SequenceConflict(body),
            500 => LiveAgentError::ServerFault(body),
            503 => LiveAgentError::AffinityRotated,
            _ => LiveAgentError::UnexpectedStatus { status, body },
        }
    }

    /// The HTTP status this error was built from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LiveAgentError::MalformedRequest(_) => Some(400),
            LiveAgentError::InvalidSession(_) => Some(403),
            LiveAgentError::NotFound(_) => Some(404),
            LiveAgentError::MethodNotAllowed(_) => Some(405),
            LiveAgentError::SequenceConflict(_) => Some(409),
            LiveAgentError::ServerFault(_) => Some(500),
            LiveAgentError::AffinityRotated => Some(503),
            LiveAgentError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether publishing this error closes the event bus.
    ///
    /// An affinity rotation is resolved by resyncing, a missing session is a
    /// local precondition failure, and a cancellation only happens after the
    /// bus has already closed. Everything else ends the session.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            LiveAgentError::AffinityRotated
                | LiveAgentError::SessionNotEstablished
                | LiveAgentError::Cancelled
        )
    }
}

impl From<TransportError> for LiveAgentError {
    fn from(err: TransportError) -> Self {
        LiveAgentError::TransportFailure(err.to_string())
    }
}

impl From<serde_json::Error> for LiveAgentError {
    fn from(err: serde_json::Error) -> Self {
        LiveAgentError::Decode(err.to_string())
    }
}
