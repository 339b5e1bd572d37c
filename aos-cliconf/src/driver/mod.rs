//! High-level driver for AOS switches.
//!
//! The driver layer turns [`Command`]s into [`Response`]s over a
//! [`Transport`](crate::transport::Transport), caches configurations and
//! device facts, and re-runs command batches until wait-for conditionals
//! hold ([`WaitFor`]).

mod aos;
mod builder;
mod command;
pub(crate) mod response;
mod wait_for;

pub use aos::{AosDriver, CHECK_MODE_WARNING, DiffOutcome, EditResult, LoadOutcome};
pub use builder::{AosDriverBuilder, DEFAULT_FAILURE_PATTERN};
pub use command::{
    ApiVersion, Command, CommandRecord, CommandSpec, ConfigFormat, ConfigSource, OutputFormat,
    Scalar,
};
pub(crate) use command::one_or_many;
pub use response::{Output, Response};
pub use wait_for::{DEFAULT_INTERVAL, DEFAULT_RETRIES, MatchPolicy, WaitFor};

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Send a command and return its response.
    fn send_command(&mut self, command: &Command) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[Command],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.send_command(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Fetch a configuration from the device.
    fn get_config(
        &mut self,
        source: ConfigSource,
        format: ConfigFormat,
        flags: &[String],
    ) -> impl Future<Output = Result<String>> + Send;
}
