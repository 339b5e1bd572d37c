//! Command task: run commands on a switch, optionally waiting for
//! conditionals on their output.
//!
//! Parameters arrive as JSON:
//!
//! ```json
//! {
//!   "commands": ["show microcode", {"command": "show vlan", "output": "json"}],
//!   "wait_for": ["result[0] contains Alcatel-Lucent"],
//!   "match": "all",
//!   "retries": 9,
//!   "interval": 1
//! }
//! ```

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::driver::{
    Command, CommandSpec, DEFAULT_RETRIES, Driver, MatchPolicy, Output, WaitFor, one_or_many,
};
use crate::error::{Error, Result};

/// Raw task parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskParams {
    #[serde(deserialize_with = "one_or_many")]
    pub commands: Vec<CommandSpec>,

    #[serde(default, alias = "waitfor", deserialize_with = "one_or_many")]
    pub wait_for: Vec<String>,

    #[serde(rename = "match", default = "default_match")]
    pub match_policy: String,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds between attempts.
    #[serde(default = "default_interval")]
    pub interval: f64,
}

fn default_match() -> String {
    MatchPolicy::All.as_str().to_string()
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_interval() -> f64 {
    1.0
}

impl TaskParams {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What a task run reports back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub changed: bool,
    pub warnings: Vec<String>,
    pub stdout: Vec<Output>,
    pub stdout_lines: Vec<Value>,
}

/// A validated command task.
#[derive(Debug, Clone)]
pub struct CommandTask {
    commands: Vec<Command>,
    wait_for: WaitFor,
    check_mode: bool,
}

impl CommandTask {
    /// Validate parameters.
    ///
    /// Every option is checked before anything is sent to a device.
    pub fn from_params(params: TaskParams) -> Result<Self> {
        if params.commands.is_empty() {
            return Err(Error::invalid_input("'commands' value is required"));
        }

        let commands = params
            .commands
            .into_iter()
            .map(Command::try_from)
            .collect::<Result<Vec<_>>>()?;

        let match_policy: MatchPolicy = params.match_policy.parse()?;
        let interval = Duration::try_from_secs_f64(params.interval).map_err(|_| {
            Error::invalid_input(format!(
                "'interval' must be a non-negative number of seconds, got {}",
                params.interval
            ))
        })?;

        let wait_for = WaitFor::parse(&params.wait_for)?
            .with_match(match_policy)
            .with_retries(params.retries)
            .with_interval(interval);

        Ok(Self {
            commands,
            wait_for,
            check_mode: false,
        })
    }

    /// Parse and validate JSON parameters.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_params(TaskParams::from_json(json)?)
    }

    /// Only run read-only commands.
    pub fn check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn wait_for(&self) -> &WaitFor {
        &self.wait_for
    }

    /// Run the task to completion.
    pub async fn run<D: Driver>(&self, driver: &mut D) -> Result<TaskResult> {
        let mut warnings = Vec::new();
        let commands = if self.check_mode {
            filter_check_mode(&self.commands, &mut warnings)
        } else {
            self.commands.clone()
        };

        debug!(
            "Running {} command(s) with {} conditional(s)",
            commands.len(),
            self.wait_for.conditionals().len()
        );
        let responses = self.wait_for.run(driver, &commands).await?;

        let stdout: Vec<Output> = responses.into_iter().map(|r| r.output).collect();
        let stdout_lines = stdout.iter().map(Output::to_lines).collect();

        Ok(TaskResult {
            changed: false,
            warnings,
            stdout,
            stdout_lines,
        })
    }
}

/// Keep only `show` commands, recording a warning for each one dropped.
pub fn filter_check_mode(commands: &[Command], warnings: &mut Vec<String>) -> Vec<Command> {
    commands
        .iter()
        .filter(|cmd| {
            if cmd.is_read_only() {
                return true;
            }
            let warning = format!(
                "Only show commands are supported when using check mode, not executing {}",
                cmd.command
            );
            warn!("{}", warning);
            warnings.push(warning);
            false
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{AosDriverBuilder, OutputFormat};
    use crate::error::ConditionalError;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let task = CommandTask::from_json(r#"{"commands": "show microcode"}"#).unwrap();
        assert_eq!(task.commands(), [Command::new("show microcode")]);
        assert_eq!(task.wait_for().match_policy(), MatchPolicy::All);
        assert_eq!(task.wait_for().retries(), 9);
        assert_eq!(task.wait_for().interval(), Duration::from_secs(1));
        assert!(task.wait_for().conditionals().is_empty());
    }

    #[test]
    fn test_waitfor_alias_and_single_string() {
        let task = CommandTask::from_json(
            r#"{"commands": ["show microcode"], "waitfor": "result[0] contains Alcatel-Lucent"}"#,
        )
        .unwrap();
        assert_eq!(task.wait_for().conditionals().len(), 1);
    }

    #[test]
    fn test_mixed_command_entries() {
        let task = CommandTask::from_json(
            r#"{"commands": ["show microcode", {"command": "show vlan", "output": "json"}],
                "match": "any", "retries": 0, "interval": 0.5}"#,
        )
        .unwrap();
        assert_eq!(task.commands()[1].output, Some(OutputFormat::Json));
        assert_eq!(task.wait_for().match_policy(), MatchPolicy::Any);
        assert_eq!(task.wait_for().retries(), 0);
        assert_eq!(task.wait_for().interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_params() {
        let err = CommandTask::from_json(r#"{"commands": ["show vlan"], "match": "most"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "match"));

        let err = CommandTask::from_json(r#"{"commands": ["show vlan"], "retries": -1}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Params(_)));

        let err = CommandTask::from_json(r#"{"commands": ["show vlan"], "interval": -1}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = CommandTask::from_json(r#"{"wait_for": ["result[0] contains x"]}"#).unwrap_err();
        assert!(matches!(err, Error::Params(_)));

        let err = CommandTask::from_json(r#"{"commands": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));

        let err = CommandTask::from_json(r#"{"commands": ["show vlan"], "wait_for": ["result[0] is x"]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Conditional(ConditionalError::Syntax { .. })
        ));
    }

    #[test]
    fn test_filter_check_mode() {
        let commands = [
            Command::new("show vlan"),
            Command::new("vlan 10 admin-state enable"),
            Command::new("show microcode"),
        ];
        let mut warnings = Vec::new();

        let kept = filter_check_mode(&commands, &mut warnings);

        assert_eq!(kept, [Command::new("show vlan"), Command::new("show microcode")]);
        assert_eq!(
            warnings,
            ["Only show commands are supported when using check mode, not executing vlan 10 admin-state enable"]
        );
    }

    #[tokio::test]
    async fn test_run_collects_output() {
        let mut driver = AosDriverBuilder::new(
            MockTransport::new()
                .reply("show microcode", "Alcatel-Lucent OS\nUos.img 8.9.221.R03\n")
                .reply("show vlan | json", r#"{"vlan": [10]}"#),
        )
        .build();

        let task = CommandTask::from_json(
            r#"{"commands": ["show microcode", {"command": "show vlan", "output": "json"}],
                "wait_for": ["result[0] contains Alcatel-Lucent", "result[1].vlan contains 10"]}"#,
        )
        .unwrap();

        let result = task.run(&mut driver).await.unwrap();

        assert!(!result.changed);
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.stdout_lines[0],
            json!(["Alcatel-Lucent OS", "Uos.img 8.9.221.R03"])
        );
        assert_eq!(result.stdout_lines[1], json!({"vlan": [10]}));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["stdout"][1], json!({"vlan": [10]}));
    }

    #[test]
    fn test_check_mode_run() {
        let mut driver = AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10"))
            .build();
        let task = CommandTask::from_json(r#"{"commands": ["show vlan", "write memory"]}"#)
            .unwrap()
            .check_mode(true);

        let result = tokio_test::block_on(task.run(&mut driver)).unwrap();

        assert_eq!(result.stdout.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(driver.transport().sent(), ["show vlan"]);
    }

    #[tokio::test]
    async fn test_unsatisfied() {
        let mut driver = AosDriverBuilder::new(MockTransport::new().reply("show vlan", "vlan 10"))
            .build();
        let task = CommandTask::from_json(
            r#"{"commands": ["show vlan"], "wait_for": ["result[0] contains vlan 20"], "retries": 1, "interval": 0}"#,
        )
        .unwrap();

        let err = task.run(&mut driver).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "One or more conditional statements have not been satisfied"
        );
        assert_eq!(driver.transport().sent_count("show vlan"), 2);
    }
}
