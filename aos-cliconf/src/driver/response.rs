//! Response type for command execution results.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Output of one command: plain text, or structured data when the device
/// answered with JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Text(String),
    Json(Value),
}

impl Output {
    /// Interpret raw device output.
    ///
    /// Output that looks like a JSON object or array and parses as one
    /// becomes [`Output::Json`]; anything else is kept as trimmed text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with(['{', '[']) {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return Output::Json(value);
            }
        }
        Output::Text(trimmed.to_string())
    }

    /// The text, if this is a text output.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(s) => Some(s),
            Output::Json(_) => None,
        }
    }

    /// The JSON value, if this is a structured output.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Output::Text(_) => None,
            Output::Json(v) => Some(v),
        }
    }

    /// Text form of the output (JSON is serialized compactly).
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Output::Text(s) => Cow::Borrowed(s),
            Output::Json(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Line-split form: text becomes an array of lines, JSON is kept whole.
    pub fn to_lines(&self) -> Value {
        match self {
            Output::Text(s) => Value::Array(s.split('\n').map(Value::from).collect()),
            Output::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed, as sent on the wire.
    pub command: String,

    /// The command output.
    pub output: Output,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure message if the device rejected the command and the caller
    /// asked not to raise on rejections.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response from raw device output.
    pub fn new(command: impl Into<String>, raw: &str, elapsed: Duration) -> Self {
        Self {
            command: command.into(),
            output: Output::parse(raw),
            elapsed,
            failure_message: None,
        }
    }

    /// Create a failed response; the failure text doubles as the output.
    pub fn failed(
        command: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let message = message.into();
        Self {
            command: command.into(),
            output: Output::Text(message.trim().to_string()),
            elapsed,
            failure_message: Some(message),
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Text form of the output.
    pub fn text(&self) -> Cow<'_, str> {
        self.output.to_text()
    }

    /// Check if the text form contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.text().contains(pattern)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_output_is_trimmed() {
        let output = Output::parse("\n  Alcatel-Lucent OS6860  \n");
        assert_eq!(output, Output::Text("Alcatel-Lucent OS6860".to_string()));
    }

    #[test]
    fn test_json_output_is_parsed() {
        let output = Output::parse(r#"{"vlan": [{"id": 10}]}"#);
        assert_eq!(output.as_json(), Some(&json!({"vlan": [{"id": 10}]})));
    }

    #[test]
    fn test_scalars_stay_text() {
        assert_eq!(Output::parse("42").as_text(), Some("42"));
        assert_eq!(Output::parse("true").as_text(), Some("true"));
    }

    #[test]
    fn test_broken_json_stays_text() {
        let output = Output::parse("[ERROR] something");
        assert_eq!(output.as_text(), Some("[ERROR] something"));
    }

    #[test]
    fn test_to_lines() {
        assert_eq!(Output::parse("a\nb").to_lines(), json!(["a", "b"]));
        assert_eq!(Output::parse("{\"a\": 1}").to_lines(), json!({"a": 1}));
    }

    #[test]
    fn test_failed_response() {
        let response = Response::failed("foo", "ERROR: Invalid entry: \"foo\"\n", Duration::ZERO);
        assert!(!response.is_success());
        assert!(response.contains("Invalid entry"));
    }
}
