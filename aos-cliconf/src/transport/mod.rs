//! Transport seam between the driver and a live device session.
//!
//! The driver never opens connections itself. Whatever owns the session
//! (SSH, a console server, a recorded fixture) implements [`Transport`] and
//! hands it to [`AosDriverBuilder`](crate::driver::AosDriverBuilder).

#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;

use crate::driver::Command;
use crate::error::Result;

/// A device session that can execute one CLI command at a time.
pub trait Transport: Send {
    /// Send one command and return its raw output.
    ///
    /// `command.command` is already the final wire text. A command the
    /// device refuses should be reported as
    /// [`TransportError::CommandRejected`](crate::error::TransportError::CommandRejected);
    /// any other error is treated as a broken session.
    fn send(&mut self, command: &Command) -> impl Future<Output = Result<String>> + Send;
}
