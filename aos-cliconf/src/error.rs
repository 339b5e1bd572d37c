//! Error types for aos-cliconf.

use std::time::Duration;

use thiserror::Error;

/// Main error type for aos-cliconf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller supplied a value outside a fixed enumeration.
    ///
    /// Always raised before any device interaction.
    #[error("'{option}' value '{value}' is invalid, valid values are {}", .valid.join(", "))]
    InvalidOption {
        option: String,
        value: String,
        valid: Vec<&'static str>,
    },

    /// A required input is missing or unusable.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Conditional parsing or evaluation errors
    #[error("Conditional error: {0}")]
    Conditional(#[from] ConditionalError),

    /// Transport-level errors from the device session
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The wait-for loop ran out of retries.
    #[error("One or more conditional statements have not been satisfied")]
    UnsatisfiedConditions { failed_conditions: Vec<String> },

    /// Task parameters could not be deserialized
    #[error("Invalid parameters: {0}")]
    Params(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidOption`] for `option` from the set of valid values.
    pub fn invalid_option(
        option: impl Into<String>,
        value: impl Into<String>,
        valid: &[&'static str],
    ) -> Self {
        Self::InvalidOption {
            option: option.into(),
            value: value.into(),
            valid: valid.to_vec(),
        }
    }

    /// Build an [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Conditional expression errors.
#[derive(Error, Debug)]
pub enum ConditionalError {
    /// The expression does not match the grammar
    #[error("failed to parse conditional '{expression}': {message}")]
    Syntax { expression: String, message: String },

    /// The expression references something the responses do not have
    #[error("unable to apply conditional '{expression}' to result: {message}")]
    Evaluation { expression: String, message: String },
}

/// Transport layer errors (device session, command rejection).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The session to the device could not be used
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The device rejected a single command
    #[error("Command '{command}' failed: {message}")]
    CommandRejected { command: String, message: String },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias using aos-cliconf's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_lists_valid_values() {
        let err = Error::invalid_option("diff_match", "fuzzy", &["line", "strict", "exact", "none"]);
        assert_eq!(
            err.to_string(),
            "'diff_match' value 'fuzzy' is invalid, valid values are line, strict, exact, none"
        );
    }

    #[test]
    fn test_unsatisfied_message() {
        let err = Error::UnsatisfiedConditions {
            failed_conditions: vec!["result[0] contains foo".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "One or more conditional statements have not been satisfied"
        );
    }

    #[test]
    fn test_transport_error_converts() {
        let err: Error = TransportError::Disconnected.into();
        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
    }
}
