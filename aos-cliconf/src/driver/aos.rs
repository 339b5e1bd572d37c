//! AOS driver: command execution, config retrieval and capability reporting
//! over an injected [`Transport`].

use std::time::Instant;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::Serialize;

use super::Driver;
use super::command::{Command, ConfigFormat, ConfigSource};
use super::response::Response;
use crate::config::{DiffOptions, diff};
use crate::error::{Error, Result, TransportError};
use crate::platform::{
    Capabilities, DEVICE_INFO_COMMANDS, DeviceInfo, DeviceOperations, OptionValues,
};
use crate::transport::Transport;

/// Error text AOS returns when asked to check a change without a config
/// session.
const CHECK_MODE_UNSUPPORTED: &str = "check mode is not supported without configuration session";

/// Warning recorded in place of [`CHECK_MODE_UNSUPPORTED`].
pub const CHECK_MODE_WARNING: &str = "AOS can not check config without config session";

/// Requests and raw replies of an `edit_config` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditResult {
    pub request: Vec<String>,
    pub response: Vec<String>,
}

/// Outcome of [`AosDriver::load_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub changed: bool,
    pub request: Vec<String>,
    pub response: Vec<String>,
    pub warnings: Vec<String>,
}

/// Result of [`AosDriver::get_diff`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffOutcome {
    pub config_diff: String,
}

/// Driver for Alcatel-Lucent Enterprise AOS switches.
///
/// Owns one [`Transport`] and executes commands on it strictly one at a
/// time. Configurations and device facts are cached for the lifetime of the
/// driver; sending any of the configured `config_commands` drops the config
/// cache.
pub struct AosDriver<T> {
    transport: T,

    /// Raise on rejected commands instead of recording them.
    check_rc: bool,

    /// Commands that change configuration.
    config_commands: Vec<String>,

    /// Output substrings that mark a command as failed.
    failure_patterns: Vec<String>,

    /// Config text keyed by the command that produced it.
    device_configs: IndexMap<String, String>,

    device_info: Option<DeviceInfo>,
    capabilities: Option<Capabilities>,
}

impl<T: Transport> AosDriver<T> {
    pub(super) fn new(
        transport: T,
        check_rc: bool,
        config_commands: Vec<String>,
        failure_patterns: Vec<String>,
    ) -> Self {
        Self {
            transport,
            check_rc,
            config_commands,
            failure_patterns,
            device_configs: IndexMap::new(),
            device_info: None,
            capabilities: None,
        }
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the driver and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Whether rejected commands raise by default.
    pub fn check_rc(&self) -> bool {
        self.check_rc
    }

    /// Commands currently held in the config cache, oldest first.
    pub fn cached_configs(&self) -> impl Iterator<Item = &str> {
        self.device_configs.keys().map(String::as_str)
    }

    /// Send one command and return its raw output.
    ///
    /// Output containing a failure pattern is reported as a rejection.
    async fn send_raw(&mut self, command: &Command) -> Result<String> {
        let raw = self.send_unchecked(command).await?;

        if let Some(pattern) = self.failure_patterns.iter().find(|p| raw.contains(p.as_str())) {
            let wire = command.wire_command();
            debug!("Output of '{}' matched failure pattern '{}'", wire, pattern);
            return Err(TransportError::CommandRejected {
                command: wire,
                message: raw.trim().to_string(),
            }
            .into());
        }

        Ok(raw)
    }

    /// Send one command without scanning its output for failure patterns.
    async fn send_unchecked(&mut self, command: &Command) -> Result<String> {
        let wire = command.to_wire();

        if self.config_commands.iter().any(|c| *c == command.command) {
            debug!("Config command '{}', dropping config cache", command.command);
            self.device_configs.clear();
        }

        debug!("Sending command: {}", wire.command);
        let raw = self.transport.send(&wire).await?;
        trace!("Raw output for '{}': {:?}", wire.command, raw);
        Ok(raw)
    }

    /// Execute one command with explicit rejection handling.
    ///
    /// With `check_rc` false a rejected command yields a failed [`Response`]
    /// carrying the device's message. Every other transport error
    /// propagates.
    pub async fn run_command(&mut self, command: &Command, check_rc: bool) -> Result<Response> {
        let start = Instant::now();
        let wire = command.wire_command();

        match self.send_raw(command).await {
            Ok(raw) => Ok(Response::new(wire, &raw, start.elapsed())),
            Err(Error::Transport(TransportError::CommandRejected { message, .. })) if !check_rc => {
                warn!("Command '{}' rejected: {}", wire, message.trim());
                Ok(Response::failed(wire, message, start.elapsed()))
            }
            Err(e) => Err(e),
        }
    }

    /// Execute commands in order, one response per command.
    pub async fn run_commands(
        &mut self,
        commands: &[Command],
        check_rc: bool,
    ) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.run_command(command, check_rc).await?);
        }
        Ok(responses)
    }

    /// Send one command and return its raw output.
    pub async fn get(&mut self, command: &Command) -> Result<String> {
        self.send_raw(command).await
    }

    /// Fetch a configuration.
    ///
    /// The result is trimmed of trailing whitespace and cached per resulting
    /// command string. Failure patterns are not applied, since configuration
    /// text may legitimately contain them.
    pub async fn get_config(
        &mut self,
        source: ConfigSource,
        format: ConfigFormat,
        flags: &[String],
    ) -> Result<String> {
        let mut cmd = source.command().to_string();
        if format == ConfigFormat::Json {
            cmd.push_str(" | json");
        }
        for flag in flags {
            cmd.push(' ');
            cmd.push_str(flag);
        }
        let cmd = cmd.trim().to_string();

        if let Some(config) = self.device_configs.get(&cmd) {
            trace!("Config cache hit for '{}'", cmd);
            return Ok(config.clone());
        }

        let raw = self.send_unchecked(&Command::new(cmd.as_str())).await?;
        let config = raw.trim_end().to_string();
        self.device_configs.insert(cmd, config.clone());
        Ok(config)
    }

    /// Send configuration commands, collecting requests and raw replies.
    pub async fn edit_config(&mut self, commands: &[Command]) -> Result<EditResult> {
        let mut result = EditResult::default();
        for command in commands {
            let reply = self.send_raw(command).await?;
            result.request.push(command.command.clone());
            result.response.push(reply);
        }
        Ok(result)
    }

    /// [`edit_config`](Self::edit_config), downgrading the device's
    /// "no check mode without a config session" refusal to a warning.
    pub async fn load_config(&mut self, commands: &[Command]) -> Result<LoadOutcome> {
        match self.edit_config(commands).await {
            Ok(result) => Ok(LoadOutcome {
                changed: !result.request.is_empty(),
                request: result.request,
                response: result.response,
                warnings: Vec::new(),
            }),
            Err(e) if e.to_string().contains(CHECK_MODE_UNSUPPORTED) => {
                warn!("{}", CHECK_MODE_WARNING);
                Ok(LoadOutcome {
                    changed: true,
                    warnings: vec![CHECK_MODE_WARNING.to_string()],
                    ..LoadOutcome::default()
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Save the running configuration.
    pub async fn commit(&mut self) -> Result<()> {
        self.send_raw(&Command::new("commit")).await?;
        Ok(())
    }

    /// Diff a candidate against a running configuration.
    ///
    /// Runs locally; the device is not contacted.
    pub fn get_diff(
        &self,
        candidate: Option<&str>,
        running: Option<&str>,
        options: &DiffOptions,
    ) -> Result<DiffOutcome> {
        let candidate = candidate.ok_or_else(|| {
            Error::invalid_input("candidate configuration is required to generate diff")
        })?;
        let result = diff(Some(candidate), running, options)?;
        Ok(DiffOutcome {
            config_diff: result.to_commands(),
        })
    }

    /// Model, version, image and hostname of the switch. Cached.
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        if let Some(info) = &self.device_info {
            return Ok(info.clone());
        }

        let [microcode, system] = DEVICE_INFO_COMMANDS;
        let microcode = self.get(&Command::new(microcode)).await?;
        let system = self.get(&Command::new(system)).await?;

        let info = DeviceInfo::parse(&microcode, &system);
        debug!("Device info: {:?}", info);
        self.device_info = Some(info.clone());
        Ok(info)
    }

    pub fn get_device_operations(&self) -> DeviceOperations {
        DeviceOperations::aos()
    }

    pub fn get_option_values(&self) -> OptionValues {
        OptionValues::aos()
    }

    /// Full capability report. Cached.
    pub async fn get_capabilities(&mut self) -> Result<Capabilities> {
        if let Some(caps) = &self.capabilities {
            return Ok(caps.clone());
        }

        let caps = Capabilities::new(self.get_device_info().await?);
        self.capabilities = Some(caps.clone());
        Ok(caps)
    }
}

impl<T: Transport> Driver for AosDriver<T> {
    async fn send_command(&mut self, command: &Command) -> Result<Response> {
        let check_rc = self.check_rc;
        self.run_command(command, check_rc).await
    }

    async fn get_config(
        &mut self,
        source: ConfigSource,
        format: ConfigFormat,
        flags: &[String],
    ) -> Result<String> {
        AosDriver::get_config(self, source, format, flags).await
    }
}
