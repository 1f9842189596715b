//! Application error types
//!
//! Every fallible operation in the crate returns [`AppResult`]. The
//! [`AppErrorKind::Problem`] kind is the user-facing error shown to the
//! shopper at checkout; the other kinds describe failures of collaborators.

use std::fmt;
use thiserror::Error;

/// Result type for crate operations
pub type AppResult<T> = Result<T, AppError>;

/// Errors raised while talking to an external service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExternalError {
    #[error("{provider} request failed: {message}")]
    PaymentProvider {
        provider: String,
        message: String,
        is_retryable: bool,
    },

    #[error("{service} rate limit exceeded")]
    RateLimit {
        service: String,
        retry_after: Option<u64>,
    },

    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },
}

/// Errors raised by local infrastructure (configuration, order storage)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InfrastructureError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppErrorKind {
    /// A problem to show to the end user as is
    #[error("{message}")]
    Problem { message: String },

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub context: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Shorthand for a user-facing problem
    pub fn problem<S: Into<String>>(message: S) -> Self {
        Self::new(AppErrorKind::Problem {
            message: message.into(),
        })
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: message.into(),
            },
        ))
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_problem(&self) -> bool {
        matches!(self.kind, AppErrorKind::Problem { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            AppErrorKind::External(ExternalError::PaymentProvider {
                is_retryable: true,
                ..
            }) | AppErrorKind::External(ExternalError::RateLimit { .. })
        )
    }

    /// The message of a [`AppErrorKind::Problem`], if this is one
    pub fn problem_message(&self) -> Option<&str> {
        match &self.kind {
            AppErrorKind::Problem { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.kind, context),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ExternalError> for AppError {
    fn from(err: ExternalError) -> Self {
        Self::new(AppErrorKind::External(err))
    }
}

impl From<InfrastructureError> for AppError {
    fn from(err: InfrastructureError) -> Self {
        Self::new(AppErrorKind::Infrastructure(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_displays_message_verbatim() {
        let err = AppError::problem("Stripe Charge does not say 'paid'.");
        assert_eq!(err.to_string(), "Stripe Charge does not say 'paid'.");
        assert!(err.is_problem());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_context_is_appended() {
        let err = AppError::configuration("STRIPE_SECRET_KEY cannot be empty")
            .with_context("loading settings");
        assert_eq!(
            err.to_string(),
            "Configuration error: STRIPE_SECRET_KEY cannot be empty (loading settings)"
        );
        assert!(err.problem_message().is_none());
    }

    #[test]
    fn test_retryable_kinds() {
        let rate_limited: AppError = ExternalError::RateLimit {
            service: "Stripe".to_string(),
            retry_after: Some(2),
        }
        .into();
        assert!(rate_limited.is_retryable());

        let rejected: AppError = ExternalError::PaymentProvider {
            provider: "Stripe".to_string(),
            message: "HTTP 401".to_string(),
            is_retryable: false,
        }
        .into();
        assert!(!rejected.is_retryable());
    }
}
