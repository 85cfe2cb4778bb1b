//! Error types for the bazaar data-access layer.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for bazaar operations.
///
/// Callers are expected to branch on the variant: transport failures can be
/// retried manually, terminal auth failures end the session, and protocol
/// failures carry the server's business error untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (rejected credentials, failed refresh).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-success API responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid origin, path, payload).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Network,
            Error::Auth(err) if err.is_terminal() => ErrorKind::SessionTerminated,
            Error::Auth(_) => ErrorKind::Unauthorized,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// True when no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when the session can no longer be recovered without a new login.
    pub fn is_session_terminated(&self) -> bool {
        matches!(self, Error::Auth(err) if err.is_terminal())
    }
}

/// Coarse error classification, cheap to copy into UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response received; a manual retry may help.
    Network,
    /// The request was rejected as unauthorized.
    Unauthorized,
    /// The refresh credential is gone; the user must log in again.
    SessionTerminated,
    /// The server answered with a business or validation failure.
    Protocol,
    /// The caller supplied something malformed.
    InvalidInput,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Network => "network",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::SessionTerminated => "session terminated",
            ErrorKind::Protocol => "protocol",
            ErrorKind::InvalidInput => "invalid input",
        };
        f.write_str(label)
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Response body could not be read or decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
///
/// Cloneable so a single refresh failure can be handed to every request
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Login rejected the supplied email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The server rejected the request and no refresh could recover it.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The refresh exchange failed; the stored credentials were cleared.
    #[error("refresh rejected: {reason}")]
    RefreshRejected { reason: String },

    /// The task driving the refresh exchange went away before it settled.
    ///
    /// Queued callers react by retrying the refresh themselves.
    #[error("refresh abandoned before completion")]
    RefreshAbandoned,
}

impl AuthError {
    /// Whether this error ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthError::RefreshRejected { .. })
    }
}

/// Protocol-level errors from API responses.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check if this is an authorization failure.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// Invalid API origin URL.
    #[error("invalid API origin '{value}': {reason}")]
    ApiOrigin { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },

    /// Invalid identifier.
    #[error("invalid id '{value}': {reason}")]
    Id { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
