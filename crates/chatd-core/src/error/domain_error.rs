//! Domain errors - error types for the coordination core

use thiserror::Error;

use crate::value_objects::{ConnectionId, IdentityId};

/// State-transition errors raised by the connection registry
///
/// Both variants indicate a caller bug rather than a runtime condition:
/// binding is write-once and callers look connections up before acting on
/// them. Handshake rejections and collaborator outages are not domain
/// errors; they flow through the notification stream and
/// [`CollaboratorError`] respectively.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A binding already exists for the connection. First binding wins;
    /// informational for the end user, loud for the caller.
    #[error("Connection already bound to identity {0}")]
    AlreadyBound(IdentityId),

    /// Operation referenced a connection the registry does not know
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyBound(_) => "ALREADY_BOUND",
            Self::ConnectionNotFound(_) => "UNKNOWN_CONNECTION",
        }
    }

    /// Check whether this is the informational lost-race case
    pub fn is_already_bound(&self) -> bool {
        matches!(self, Self::AlreadyBound(_))
    }
}

/// Errors crossing the external-collaborator boundary
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or errored internally
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
