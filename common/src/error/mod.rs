//! Error types for the marketplace engine
//!
//! This module provides a unified error handling system for all services
//! in the marketplace platform. It defines standard error types that can be
//! used across service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// Marketplace engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error when an order cannot be found (missing, soft-deleted, or not
    /// matching the caller's ownership filter -- indistinguishable on purpose)
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Error when an agent tries to accept an order that already has a seller
    #[error("Order already assigned: {0}")]
    OrderAlreadyAssigned(String),

    /// Error when an agent mutates an order that is not assigned to them
    #[error("Not the order owner: {0}")]
    NotOrderOwner(String),

    /// Error when a commission rate falls outside [0, 100]
    #[error("Invalid commission rate: {0}")]
    InvalidCommissionRate(String),

    /// Error when an order amount is not positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Error when a payment session id has already produced an order
    #[error("Duplicate payment session: {0}")]
    DuplicatePaymentSession(String),

    /// Error when a status change is not in the lifecycle transition table
    #[error("Illegal status transition: {0}")]
    IllegalTransition(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::OrderNotFound(msg) => Error::OrderNotFound(format!("{}: {}", context, msg)),
                Error::OrderAlreadyAssigned(msg) => {
                    Error::OrderAlreadyAssigned(format!("{}: {}", context, msg))
                }
                Error::NotOrderOwner(msg) => Error::NotOrderOwner(format!("{}: {}", context, msg)),
                Error::InvalidCommissionRate(msg) => {
                    Error::InvalidCommissionRate(format!("{}: {}", context, msg))
                }
                Error::InvalidAmount(msg) => Error::InvalidAmount(format!("{}: {}", context, msg)),
                Error::DuplicatePaymentSession(msg) => {
                    Error::DuplicatePaymentSession(format!("{}: {}", context, msg))
                }
                Error::IllegalTransition(msg) => {
                    Error::IllegalTransition(format!("{}: {}", context, msg))
                }
                Error::ValidationError(msg) => {
                    Error::ValidationError(format!("{}: {}", context, msg))
                }
                Error::ConfigurationError(msg) => {
                    Error::ConfigurationError(format!("{}: {}", context, msg))
                }
                Error::AuthorizationError(msg) => {
                    Error::AuthorizationError(format!("{}: {}", context, msg))
                }
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
