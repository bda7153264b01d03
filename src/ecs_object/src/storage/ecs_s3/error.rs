//! Error types for ECS object operations.
//!
//! Failures reported by the service are classified into a small taxonomy,
//! and every classified failure keeps the HTTP status and service
//! error code so callers can branch on whichever they need.

use std::fmt;

use thiserror::Error;

/// Result type for ECS object operations.
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;

/// Details the service attached to a failed response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceErrorDetail {
    /// HTTP status code of the response.
    pub status: u16,
    /// Service error code (`<Code>` in the error body), e.g. `NoSuchKey`.
    pub code: Option<String>,
    /// Human readable message from the error body.
    pub message: Option<String>,
    /// Request id assigned by the service.
    pub request_id: Option<String>,
    /// Resource the error refers to.
    pub resource: Option<String>,
}

impl ServiceErrorDetail {
    /// Create a detail carrying only a status code.
    pub fn from_status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

impl fmt::Display for ServiceErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Fieldless mirror of [`ObjectError`] for matching on the classification alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    PreconditionFailed,
    ObjectUnderRetention,
    NotFound,
    Service,
    Transport,
    InvalidResponse,
}

/// Errors that can occur during ECS object operations.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The request could not be composed; nothing was sent.
    #[error("invalid request configuration: {message}")]
    Configuration {
        /// What was wrong with the request.
        message: String,
    },

    /// One or more write conditions did not hold (HTTP 412).
    #[error("precondition failed: {0}")]
    PreconditionFailed(ServiceErrorDetail),

    /// The object's retention window is still active.
    #[error("object under retention: {0}")]
    ObjectUnderRetention(ServiceErrorDetail),

    /// The target object does not exist.
    #[error("object not found: {0}")]
    NotFound(ServiceErrorDetail),

    /// Any other failure reported by the service.
    #[error("service error: {0}")]
    Service(ServiceErrorDetail),

    /// The HTTP layer failed before a response was available.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response was missing data the operation needs.
    #[error("invalid {operation} response: {message}")]
    InvalidResponse {
        /// Operation whose response was malformed.
        operation: &'static str,
        /// Description of the problem.
        message: String,
    },
}

impl ObjectError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        ObjectError::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(operation: &'static str, message: impl Into<String>) -> Self {
        ObjectError::InvalidResponse {
            operation,
            message: message.into(),
        }
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjectError::Configuration { .. } => ErrorKind::Configuration,
            ObjectError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            ObjectError::ObjectUnderRetention(_) => ErrorKind::ObjectUnderRetention,
            ObjectError::NotFound(_) => ErrorKind::NotFound,
            ObjectError::Service(_) => ErrorKind::Service,
            ObjectError::Transport(_) => ErrorKind::Transport,
            ObjectError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
        }
    }

    /// Service details, when the error came from a service response.
    pub fn detail(&self) -> Option<&ServiceErrorDetail> {
        match self {
            ObjectError::PreconditionFailed(detail)
            | ObjectError::ObjectUnderRetention(detail)
            | ObjectError::NotFound(detail)
            | ObjectError::Service(detail) => Some(detail),
            _ => None,
        }
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ObjectError::Transport(e) => e.status().map(|s| s.as_u16()),
            other => other.detail().map(|d| d.status),
        }
    }

    /// Service error code associated with the failure, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.detail().and_then(|d| d.code.as_deref())
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, ObjectError::PreconditionFailed(_))
    }

    pub fn is_under_retention(&self) -> bool {
        matches!(self, ObjectError::ObjectUnderRetention(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectError::NotFound(_))
    }
}
