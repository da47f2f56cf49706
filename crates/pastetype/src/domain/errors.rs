//! Domain-specific errors.

use thiserror::Error;

/// Failure taxonomy for the paste command.
///
/// Every variant is terminal for the invocation: the buffer is never touched
/// once one of these is produced. The `Display` text is the short user-facing
/// message; [`PasteError::details`] carries the raw runtime output when there
/// is any.
#[derive(Debug, Error)]
pub enum PasteError {
    /// The external code generation runtime failed to come up.
    #[error("Couldn't initialize the code generation runtime")]
    RuntimeInit,
    /// The clipboard held no text to work with.
    #[error("Couldn't get JSON from clipboard")]
    EmptyClipboard,
    /// The runtime rejected the clipboard text as unparseable JSON.
    #[error("Clipboard does not contain valid JSON")]
    InvalidJson { details: String },
    /// Anything else the runtime reported.
    #[error("Code generation failed with an internal error")]
    Internal { details: String },
}

impl PasteError {
    /// Raw failure details for logging. Variants without extra detail report
    /// a fixed placeholder.
    pub fn details(&self) -> &str {
        match self {
            PasteError::InvalidJson { details } | PasteError::Internal { details } => details,
            PasteError::RuntimeInit | PasteError::EmptyClipboard => "no details",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clipboard_message_is_stable() {
        assert_eq!(
            PasteError::EmptyClipboard.to_string(),
            "Couldn't get JSON from clipboard"
        );
    }

    #[test]
    fn details_fall_back_to_a_placeholder() {
        assert_eq!(PasteError::RuntimeInit.details(), "no details");
        let err = PasteError::Internal {
            details: "stack trace".to_owned(),
        };
        assert_eq!(err.details(), "stack trace");
    }
}
