//! # Error Types
//!
//! Domain-specific error types for savour-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  savour-core errors (this file)                                        │
//! │  ├── CoreError         - Structural failures (abort, fail fast)        │
//! │  └── ValidationError   - Mutation input validation failures            │
//! │                                                                         │
//! │  savour-db errors (separate crate)                                     │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  NOT errors (see engine::VatWarning)                                   │
//! │  └── Data-quality issues - missing rate, cost mismatch, non-standard   │
//! │      rate. Collected into warning lists; computation proceeds with a   │
//! │      documented fallback. Tax tooling must still produce A number.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, field, figures)
//! 3. Errors are enum variants, never String
//! 4. Validation and not-found abort immediately; data quality never does

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These abort the calling operation and surface immediately - they indicate
/// programmer or admin error, never imperfect catalog data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Structurally invalid input to a calculation.
    ///
    /// ## When This Occurs
    /// - Negative component cost or item price
    /// - Empty item reference on a line item
    /// - Zero or negative line quantity
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - Applying a template that was deactivated or never existed
    /// - Patching a component by an unknown id
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for catalog mutations.
///
/// These occur when admin input doesn't meet requirements. Used for early
/// validation before anything is written; the owning transaction rolls back.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A collection that must not be empty is empty.
    ///
    /// ## When This Occurs
    /// Creating a component template with no components - an empty template
    /// has no meaning and would silently zero-rate anything it's applied to.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::invalid_input("component cost is negative: -100");
        assert_eq!(
            err.to_string(),
            "Invalid input: component cost is negative: -100"
        );

        let err = CoreError::not_found("ComponentTemplate", "abc-123");
        assert_eq!(err.to_string(), "ComponentTemplate not found: abc-123");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Empty {
            field: "components".to_string(),
        };
        assert_eq!(err.to_string(), "components must contain at least one entry");

        let err = ValidationError::Negative {
            field: "cost".to_string(),
        };
        assert_eq!(err.to_string(), "cost must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
