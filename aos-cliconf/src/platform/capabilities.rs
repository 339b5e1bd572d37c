//! Capability report for the AOS CLI adapter.

use serde::Serialize;

use super::DeviceInfo;
use crate::config::{DiffMatch, DiffReplace};
use crate::driver::{ConfigFormat, OutputFormat};
use crate::error::Result;

/// Operations the adapter exposes.
pub const RPC: &[&str] = &[
    "get_config",
    "edit_config",
    "get_capabilities",
    "get",
    "commit",
    "get_diff",
    "run_commands",
];

/// Device-side configuration features. AOS supports none of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceOperations {
    pub supports_diff_replace: bool,
    pub supports_commit: bool,
    pub supports_rollback: bool,
    pub supports_defaults: bool,
    pub supports_onbox_diff: bool,
    pub supports_commit_comment: bool,
    pub supports_multiline_delimiter: bool,
    pub supports_diff_match: bool,
    pub supports_diff_ignore_lines: bool,
    pub supports_generate_diff: bool,
    pub supports_replace: bool,
}

impl DeviceOperations {
    pub fn aos() -> Self {
        Self::default()
    }
}

/// Accepted values for each enumerated option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValues {
    pub format: &'static [&'static str],
    pub diff_match: &'static [&'static str],
    pub diff_replace: &'static [&'static str],
    pub output: &'static [&'static str],
}

impl OptionValues {
    pub fn aos() -> Self {
        Self {
            format: ConfigFormat::VALUES,
            diff_match: DiffMatch::VALUES,
            diff_replace: DiffReplace::VALUES,
            output: OutputFormat::VALUES,
        }
    }
}

/// Everything a caller needs to know before talking to the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub rpc: &'static [&'static str],
    pub network_api: &'static str,
    pub device_info: DeviceInfo,
    pub device_operations: DeviceOperations,
    #[serde(flatten)]
    pub option_values: OptionValues,
}

impl Capabilities {
    pub fn new(device_info: DeviceInfo) -> Self {
        Self {
            rpc: RPC,
            network_api: "cliconf",
            device_info,
            device_operations: DeviceOperations::aos(),
            option_values: OptionValues::aos(),
        }
    }

    /// Serialize as a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
