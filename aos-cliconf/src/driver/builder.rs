//! Builder for creating AOS drivers.

use super::aos::AosDriver;
use crate::transport::Transport;

/// Substring AOS prints when it refuses a command.
pub const DEFAULT_FAILURE_PATTERN: &str = "ERROR:";

/// Builder for constructing an [`AosDriver`].
///
/// # Example
///
/// ```rust,ignore
/// use aos_cliconf::driver::AosDriverBuilder;
///
/// let driver = AosDriverBuilder::new(transport)
///     .check_rc(false)
///     .config_commands(["write memory", "copy running certified"])
///     .build();
/// ```
pub struct AosDriverBuilder<T> {
    transport: T,
    check_rc: bool,
    config_commands: Vec<String>,
    failure_patterns: Vec<String>,
}

impl<T: Transport> AosDriverBuilder<T> {
    /// Create a new builder around a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            check_rc: true,
            config_commands: Vec::new(),
            failure_patterns: vec![DEFAULT_FAILURE_PATTERN.to_string()],
        }
    }

    /// Raise on rejected commands (default: true).
    pub fn check_rc(mut self, check_rc: bool) -> Self {
        self.check_rc = check_rc;
        self
    }

    /// Mark a command as configuration-changing.
    pub fn config_command(mut self, command: impl Into<String>) -> Self {
        self.config_commands.push(command.into());
        self
    }

    /// Mark several commands as configuration-changing.
    pub fn config_commands<S: Into<String>>(
        mut self,
        commands: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config_commands.extend(commands.into_iter().map(Into::into));
        self
    }

    /// Add an output substring that marks a command as failed.
    pub fn failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failure_patterns.push(pattern.into());
        self
    }

    /// Drop all failure patterns, including the default.
    pub fn clear_failure_patterns(mut self) -> Self {
        self.failure_patterns.clear();
        self
    }

    /// Build the driver.
    pub fn build(self) -> AosDriver<T> {
        AosDriver::new(
            self.transport,
            self.check_rc,
            self.config_commands,
            self.failure_patterns,
        )
    }
}
