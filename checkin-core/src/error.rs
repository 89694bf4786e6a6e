//! Error types for the checkin-core crate.
//!
//! Every variant here is a validation failure: it is detected before any
//! store call and is deterministic for a given input, so retrying is never
//! meaningful.

/// Errors raised while validating or preparing a relationship change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckInError {
    /// `UserId` or `ContactId` was empty or whitespace-only.
    #[error("invalid input: UserId and ContactId must be provided")]
    MissingIdentity,

    /// A field that must carry a value was empty or explicitly null.
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// The check-in frequency label is not one of the recognized labels.
    #[error("invalid CheckInFrequency: {0}")]
    InvalidFrequency(String),

    /// A field was present but malformed.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Stored field name.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// An update carried none of the updatable fields.
    #[error("no fields provided to update")]
    NoFieldsProvided,
}

/// Convenience type alias for checkin-core results.
pub type Result<T> = std::result::Result<T, CheckInError>;
