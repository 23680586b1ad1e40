//! Core error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, EventError>;

/// Errors produced while normalizing notifications.
#[derive(Error, Debug)]
pub enum EventError {
    /// A numeric field arrived in a form that cannot be parsed. The
    /// triggering notification is dropped; later notifications are
    /// unaffected.
    #[error("malformed {field} value {value:?} in {notification} notification")]
    MalformedField {
        notification: &'static str,
        field: &'static str,
        value: String,
    },

    /// The follow announcement pattern failed to compile.
    #[error("invalid follow announcement pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The follow announcement pattern compiled but has no `username`
    /// capture group to extract the follower name from.
    #[error("follow announcement pattern is missing the `username` capture group")]
    PatternMissingGroup,
}

impl EventError {
    /// Create a malformed-field error for a notification numeric field.
    pub fn malformed(
        notification: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::MalformedField {
            notification,
            field,
            value: value.into(),
        }
    }
}
