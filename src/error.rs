//! Desk error types with numeric code mapping.
//!
//! [`DeskError`] is the central error type of the coordination layer. No
//! variant is fatal: each one is either logged and suppressed (subscriber
//! failures) or surfaced to the user for correction (validation, save).

use std::fmt;

use serde::Serialize;

/// Per-field diagnostics produced when the filter fails validation.
///
/// Each date input gets its own message so the presentation layer can
/// attach them to the right control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterValidationError {
    /// Diagnostic for the start date input, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Diagnostic for the end date input, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl FilterValidationError {
    /// Returns `true` when no field carries a diagnostic.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

impl fmt::Display for FilterValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.start_date.as_deref(), self.end_date.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FilterValidationError {}

/// Coordination-layer error enum with numeric code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            |
/// |-----------|---------------------|
/// | 1000–1999 | Validation / input  |
/// | 2000–2999 | Workflow state      |
/// | 3000–3999 | Collaborator        |
/// | 5000–5999 | Internal            |
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Filter criteria failed the date rules.
    #[error("invalid filter: {0}")]
    Validation(#[from] FilterValidationError),

    /// A value could not be parsed or is out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The modal was already closed when an action was attempted.
    #[error("modal already closed: {0}")]
    ModalClosed(&'static str),

    /// No car is selected for an operation that needs one.
    #[error("no car selected")]
    NoSelection,

    /// A bus subscriber failed while handling a message.
    #[error("subscriber failed on channel {channel}: {message}")]
    Subscriber {
        /// Channel the message was delivered on.
        channel: &'static str,
        /// Failure description.
        message: String,
    },

    /// The save collaborator rejected or failed to persist a record.
    #[error("save failed: {0}")]
    Save(String),

    /// The catalog query collaborator failed.
    #[error("query failed: {0}")]
    Query(String),

    /// The record-field lookup collaborator failed.
    #[error("record lookup failed: {0}")]
    Lookup(String),

    /// The picklist metadata collaborator failed.
    #[error("picklist lookup failed: {0}")]
    Picklist(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidInput(_) => 1002,
            Self::ModalClosed(_) => 2001,
            Self::NoSelection => 2002,
            Self::Save(_) => 3001,
            Self::Query(_) => 3002,
            Self::Lookup(_) => 3003,
            Self::Picklist(_) => 3004,
            Self::Subscriber { .. } => 5001,
            Self::Internal(_) => 5000,
        }
    }

    /// Returns `true` if the user can recover by correcting input or
    /// repeating the action.
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidInput(_)
                | Self::NoSelection
                | Self::Save(_)
                | Self::Query(_)
                | Self::Lookup(_)
        )
    }

    /// Message suitable for showing next to the control that caused it.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Save(message)
            | Self::Query(message)
            | Self::Lookup(message)
            | Self::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category_ranges() {
        let validation = DeskError::from(FilterValidationError::default());
        assert_eq!(validation.error_code(), 1001);
        assert_eq!(DeskError::ModalClosed("booking").error_code(), 2001);
        assert_eq!(DeskError::Save("boom".to_string()).error_code(), 3001);
        assert_eq!(DeskError::Internal("x".to_string()).error_code(), 5000);
    }

    #[test]
    fn validation_display_joins_field_messages() {
        let err = FilterValidationError {
            start_date: Some("Start date is required".to_string()),
            end_date: Some("End date is required".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Start date is required; End date is required"
        );
        assert!(!err.is_empty());
    }

    #[test]
    fn save_user_message_is_bare() {
        let err = DeskError::Save("Customer is required".to_string());
        assert_eq!(err.user_message(), "Customer is required");
        assert!(err.is_user_recoverable());
        assert!(!DeskError::Internal("x".to_string()).is_user_recoverable());
    }
}
