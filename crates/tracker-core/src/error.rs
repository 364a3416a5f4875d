//! # Error Hierarchy
//!
//! Structured errors for the tracker domain, built with `thiserror`.
//! Messages are written for the person filling in a form, since most of them
//! end up rendered next to a form field.

use thiserror::Error;

/// Top-level error type for domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// A field value violates a record constraint.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A monetary amount could not be parsed or is out of range.
    #[error("amount error: {0}")]
    Amount(#[from] AmountError),
}

/// Constraint violations on record fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeds its maximum length.
    #[error("{field} must not exceed {max} characters (it has {actual})")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum permitted length in characters.
        max: usize,
        /// Actual length in characters.
        actual: usize,
    },

    /// A field contains characters outside its permitted set.
    #[error("{0} contains invalid characters")]
    InvalidCharacters(&'static str),

    /// Approval rating outside 0..=100.
    #[error("rating percentage must be between 0 and 100, got {0}")]
    RatingOutOfRange(i64),

    /// A ticket state string that names no known state.
    #[error("unknown ticket state: \"{0}\"")]
    UnknownTicketState(String),

    /// A payment amount that must not be negative.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),
}

/// Errors while parsing a decimal amount into [`crate::Money`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input was blank.
    #[error("amount is empty")]
    Empty,

    /// The input is not a decimal number.
    #[error("\"{0}\" is not a number")]
    NotANumber(String),

    /// More digits after the decimal point than permitted.
    #[error("Ensure that there are no more than {max} decimal places.")]
    TooManyDecimalPlaces {
        /// Permitted decimal places.
        max: usize,
    },

    /// More significant digits than the column can hold.
    #[error("Ensure that there are no more than {max} digits in total.")]
    TooManyDigits {
        /// Permitted total digits.
        max: usize,
    },

    /// The value does not fit in the cent representation.
    #[error("amount is out of range")]
    Overflow,
}
