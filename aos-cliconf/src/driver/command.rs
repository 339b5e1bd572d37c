//! Command records and output formatting.
//!
//! A [`Command`] is what the caller asks for; [`Command::to_wire`] is what
//! actually goes to the device once the output format and API version have
//! been folded into the command text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Requested output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub const VALUES: &'static [&'static str] = &["text", "json"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::invalid_option("output", s, Self::VALUES)),
        }
    }
}

/// Format of a configuration fetched with `get_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Text,
    Json,
}

impl ConfigFormat {
    pub const VALUES: &'static [&'static str] = &["text", "json"];
}

impl FromStr for ConfigFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ConfigFormat::Text),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(Error::invalid_option("format", s, Self::VALUES)),
        }
    }
}

/// Which configuration to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Running,
    Startup,
}

impl ConfigSource {
    pub const VALUES: &'static [&'static str] = &["running", "startup"];

    /// The device command that prints this configuration.
    pub fn command(&self) -> &'static str {
        match self {
            ConfigSource::Running => "show configuration snapshot",
            ConfigSource::Startup => "cat working/vcsetup.cfg",
        }
    }
}

impl FromStr for ConfigSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(ConfigSource::Running),
            "startup" => Ok(ConfigSource::Startup),
            _ => Err(Error::invalid_option("source", s, Self::VALUES)),
        }
    }
}

/// Structured output API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    Latest,
    V1,
}

impl ApiVersion {
    pub const VALUES: &'static [&'static str] = &["latest", "1"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Latest => "latest",
            ApiVersion::V1 => "1",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "latest" => Ok(ApiVersion::Latest),
            "1" => Ok(ApiVersion::V1),
            _ => Err(Error::invalid_option("version", s, Self::VALUES)),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command to run on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command text.
    pub command: String,

    /// Requested output format; `None` sends the command as written.
    pub output: Option<OutputFormat>,

    /// Prompts the command may raise.
    pub prompt: Vec<String>,

    /// Answers to those prompts, positional.
    pub answer: Vec<String>,

    /// Terminate the command with a newline.
    pub newline: bool,

    /// Send without waiting for output.
    pub sendonly: bool,

    /// Answer every prompt before returning.
    pub check_all: bool,

    /// Structured output API version.
    pub version: ApiVersion,
}

impl Command {
    /// Create a plain command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: None,
            prompt: Vec::new(),
            answer: Vec::new(),
            newline: true,
            sendonly: false,
            check_all: false,
            version: ApiVersion::Latest,
        }
    }

    /// Request an output format.
    pub fn output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }

    /// Answer `prompt` with `answer`.
    pub fn prompt(mut self, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        self.prompt.push(prompt.into());
        self.answer.push(answer.into());
        self
    }

    /// Pin the structured output API version.
    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    /// Send without waiting for output.
    pub fn sendonly(mut self, sendonly: bool) -> Self {
        self.sendonly = sendonly;
        self
    }

    /// Command text with output format and version applied.
    ///
    /// Without a requested output format the text is returned unchanged.
    pub fn wire_command(&self) -> String {
        let Some(output) = self.output else {
            return self.command.clone();
        };

        let mut cmd = if output == OutputFormat::Json && !self.command.ends_with("| json") {
            format!("{} | json", self.command)
        } else {
            self.command.clone()
        };

        if self.version != ApiVersion::Latest && cmd.contains("| json") {
            cmd = format!("{cmd} version {}", self.version);
        }
        cmd
    }

    /// The command as sent to the transport: formatting folded into the text.
    pub fn to_wire(&self) -> Command {
        Command {
            command: self.wire_command(),
            output: None,
            version: ApiVersion::Latest,
            ..self.clone()
        }
    }

    /// Whether this is a read-only `show` command.
    pub fn is_read_only(&self) -> bool {
        self.command.starts_with("show")
    }
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        Command::new(command)
    }
}

impl From<String> for Command {
    fn from(command: String) -> Self {
        Command::new(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

/// A command entry as supplied by a caller: a bare string or a record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Bare(String),
    Record(CommandRecord),
}

/// Record form of a [`CommandSpec`].
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub prompt: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub answer: Vec<String>,
    #[serde(default = "default_newline")]
    pub newline: bool,
    #[serde(default)]
    pub sendonly: bool,
    #[serde(default)]
    pub check_all: bool,
    #[serde(default)]
    pub version: Option<Scalar>,
}

/// A string or a number; `version: 1` and `version: "1"` are the same.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(u64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

fn default_newline() -> bool {
    true
}

impl TryFrom<CommandSpec> for Command {
    type Error = Error;

    fn try_from(spec: CommandSpec) -> Result<Self> {
        let record = match spec {
            CommandSpec::Bare(command) => return Ok(Command::new(command)),
            CommandSpec::Record(record) => record,
        };

        let output = record.output.as_deref().map(str::parse).transpose()?;
        let version = match record.version {
            Some(v) => v.to_string().parse()?,
            None => ApiVersion::Latest,
        };

        Ok(Command {
            command: record.command,
            output,
            prompt: record.prompt,
            answer: record.answer,
            newline: record.newline,
            sendonly: record.sendonly,
            check_all: record.check_all,
            version,
        })
    }
}

/// Accept either a single value or a list of values.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_command_is_unchanged() {
        assert_eq!(Command::new("show vlan").wire_command(), "show vlan");
    }

    #[test]
    fn test_json_output_appends_pipe() {
        let cmd = Command::new("show vlan").output(OutputFormat::Json);
        assert_eq!(cmd.wire_command(), "show vlan | json");

        let cmd = Command::new("show vlan | json").output(OutputFormat::Json);
        assert_eq!(cmd.wire_command(), "show vlan | json");
    }

    #[test]
    fn test_text_output_is_unchanged() {
        let cmd = Command::new("show vlan").output(OutputFormat::Text);
        assert_eq!(cmd.wire_command(), "show vlan");
    }

    #[test]
    fn test_version_only_with_json() {
        let cmd = Command::new("show vlan")
            .output(OutputFormat::Json)
            .version(ApiVersion::V1);
        assert_eq!(cmd.wire_command(), "show vlan | json version 1");

        let cmd = Command::new("show vlan")
            .output(OutputFormat::Text)
            .version(ApiVersion::V1);
        assert_eq!(cmd.wire_command(), "show vlan");
    }

    #[test]
    fn test_to_wire_folds_formatting() {
        let cmd = Command::new("show vlan")
            .output(OutputFormat::Json)
            .prompt("[confirm]", "y");
        let wire = cmd.to_wire();
        assert_eq!(wire.command, "show vlan | json");
        assert_eq!(wire.output, None);
        assert_eq!(wire.prompt, vec!["[confirm]"]);
        assert_eq!(wire.answer, vec!["y"]);
    }

    #[test]
    fn test_invalid_options() {
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "output"));

        let err = "2".parse::<ApiVersion>().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "version"));

        let err = "candidate".parse::<ConfigSource>().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "source"));

        let err = "xml".parse::<ConfigFormat>().unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "format"));
    }

    #[test]
    fn test_bare_string_entry() {
        let spec: CommandSpec = serde_json::from_value(json!("show microcode")).unwrap();
        let cmd = Command::try_from(spec).unwrap();
        assert_eq!(cmd, Command::new("show microcode"));
    }

    #[test]
    fn test_record_entry() {
        let spec: CommandSpec = serde_json::from_value(json!({
            "command": "clear counters GigabitEthernet2",
            "prompt": "[confirm]",
            "answer": "y",
            "version": 1,
            "output": "json"
        }))
        .unwrap();
        let cmd = Command::try_from(spec).unwrap();
        assert_eq!(cmd.prompt, vec!["[confirm]"]);
        assert_eq!(cmd.answer, vec!["y"]);
        assert_eq!(cmd.version, ApiVersion::V1);
        assert_eq!(cmd.output, Some(OutputFormat::Json));
        assert!(cmd.newline);
        assert!(!cmd.sendonly);
    }

    #[test]
    fn test_record_with_bad_output() {
        let spec: CommandSpec =
            serde_json::from_value(json!({"command": "show vlan", "output": "xml"})).unwrap();
        assert!(matches!(
            Command::try_from(spec),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_read_only() {
        assert!(Command::new("show vlan").is_read_only());
        assert!(!Command::new("vlan 10 admin-state enable").is_read_only());
    }
}
