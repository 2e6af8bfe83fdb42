//! Service error types

use crate::session::{ErrorInfo, ErrorKind};
use thiserror::Error;

/// Catalog or assistant call failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::TimedOut, message)
    }

    pub fn server_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::ServerStatus(status), message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Malformed, message)
    }

    /// Classify a transport-level reqwest failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timed_out(format!("Request timed out: {err}"))
        } else if err.is_decode() {
            Self::malformed(format!("Unreadable response body: {err}"))
        } else {
            Self::network(format!("Could not reach service: {err}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection refused, reset, DNS failure
    Network,
    /// Transport or coordinator deadline expired
    TimedOut,
    /// Non-2xx response
    ServerStatus(u16),
    /// Body was not the expected JSON shape
    Malformed,
}

impl From<ServiceErrorKind> for ErrorKind {
    fn from(kind: ServiceErrorKind) -> Self {
        match kind {
            ServiceErrorKind::Network => ErrorKind::Network,
            ServiceErrorKind::TimedOut => ErrorKind::TimedOut,
            ServiceErrorKind::ServerStatus(_) => ErrorKind::ServerStatus,
            ServiceErrorKind::Malformed => ErrorKind::MalformedReply,
        }
    }
}

impl From<ServiceError> for ErrorInfo {
    fn from(err: ServiceError) -> Self {
        ErrorInfo::new(err.kind.into(), err.message)
    }
}
