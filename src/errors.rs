//! Unified error types for the storefront sync layer.
//!
//! Remote (database) failures propagate through [`Error`]. Local persistence
//! failures are fail-soft: they are logged at the call site and surfaced as an
//! [`Outcome::Degraded`] carrying the fallback value, so callers can observe
//! degradation without having to handle it.

use thiserror::Error;

/// All errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Remote product service (database) failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persisted key-value slot could not be read or written
    #[error("Storage error on slot '{key}': {message}")]
    Storage {
        /// Slot key
        key: String,
        /// Underlying failure
        message: String,
    },

    /// Slot payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem or signal-handling failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Price is negative, NaN or infinite
    #[error("Invalid price: {amount}")]
    InvalidPrice {
        /// The rejected amount
        amount: f64,
    },

    /// A product field failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong
        message: String,
    },

    /// No product with this id exists
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// The id that was looked up
        id: String,
    },

    /// Async work was requested outside a Tokio runtime
    #[error("Runtime error: {message}")]
    Runtime {
        /// Description of the missing runtime context
        message: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Storage`] on the given slot.
    pub fn storage(key: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// Result of a fail-soft operation.
///
/// `Degraded` still carries a usable value (usually the baseline catalog or
/// the unchanged local list) together with the failure that forced it.
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    /// The operation did what was asked
    Complete(T),
    /// The operation fell back to `value` because of `reason`
    Degraded {
        /// Fallback value
        value: T,
        /// Why the fallback was taken
        reason: Error,
    },
}

impl<T> Outcome<T> {
    /// Returns the carried value regardless of degradation.
    pub fn into_inner(self) -> T {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Borrows the carried value.
    pub const fn value(&self) -> &T {
        match self {
            Self::Complete(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// `true` when a fallback was taken.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure behind a degraded outcome, if any.
    pub const fn reason(&self) -> Option<&Error> {
        match self {
            Self::Complete(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Maps the carried value, keeping the degradation status.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok: Outcome<u8> = Outcome::Complete(1);
        assert!(!ok.is_degraded());
        assert!(ok.reason().is_none());
        assert_eq!(ok.into_inner(), 1);

        let degraded: Outcome<u8> = Outcome::Degraded {
            value: 2,
            reason: Error::storage("produtos", "quota exceeded"),
        };
        assert!(degraded.is_degraded());
        assert!(matches!(degraded.reason(), Some(Error::Storage { .. })));
        let mapped = degraded.map(|v| v * 10);
        assert!(mapped.is_degraded());
        assert_eq!(*mapped.value(), 20);
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::storage("produtos", "disk full");
        assert_eq!(err.to_string(), "Storage error on slot 'produtos': disk full");
    }
}
