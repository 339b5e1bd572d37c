//! Device facts scraped from `show microcode` and `show system`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Commands whose output feeds [`DeviceInfo::parse`], in order.
pub const DEVICE_INFO_COMMANDS: [&str; 2] = ["show microcode", "show system"];

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\.\d+\.\d+\.\w+\b").unwrap());
static IMAGE_DIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(/[\w/]+)").unwrap());
static IMAGE_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+\.\w+)\b").unwrap());
static MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Description:\s+.*?(\bOS[\w-]+)\b").unwrap());
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Name:\s+(\S+),?").unwrap());

/// Basic facts about the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub network_os: String,

    #[serde(rename = "network_os_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Running image, as `<directory>/<file>`.
    #[serde(rename = "network_os_image", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(rename = "network_os_model", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(rename = "network_os_hostname", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl DeviceInfo {
    /// Build from the outputs of [`DEVICE_INFO_COMMANDS`].
    ///
    /// Facts that cannot be found are left as `None`.
    pub fn parse(microcode: &str, system: &str) -> Self {
        let microcode = microcode.trim();
        let system = system.trim();

        let version = VERSION_RE.find(microcode).map(|m| m.as_str().to_string());

        let image = match (
            IMAGE_DIR_RE.captures(microcode),
            IMAGE_FILE_RE.captures(microcode),
        ) {
            (Some(dir), Some(file)) => Some(format!("{}/{}", &dir[1], &file[1])),
            _ => None,
        };

        let model = MODEL_RE.captures(system).map(|c| c[1].to_string());
        let hostname = HOSTNAME_RE
            .captures(system)
            .map(|c| c[1].trim_end_matches(',').to_string());

        Self {
            network_os: "aos".to_string(),
            version,
            image,
            model,
            hostname,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MICROCODE: &str = "
/flash/working
  Package           Release                 Size     Description
-----------------+-------------------------+--------+-----------------------------------
Uos.img           8.9.221.R03               248054207 Alcatel-Lucent OS
";

    const SYSTEM: &str = "
System:
  Description:  Alcatel-Lucent Enterprise OS6860E-P24 8.9.221.R03 GA, November 02, 2023.,
  Object ID:    1.3.6.1.4.1.6486.801.1.1.2.1.11.1.7,
  Up Time:      12 days 3 hours 2 minutes and 22 seconds,
  Contact:      Alcatel-Lucent Enterprise, https://www.al-enterprise.com,
  Name:         core-sw-01,
  Location:     Lab,
";

    #[test]
    fn test_parse_full() {
        let info = DeviceInfo::parse(MICROCODE, SYSTEM);
        assert_eq!(info.network_os, "aos");
        assert_eq!(info.version.as_deref(), Some("8.9.221.R03"));
        assert_eq!(info.image.as_deref(), Some("/flash/working/Uos.img"));
        assert_eq!(info.model.as_deref(), Some("OS6860E-P24"));
        assert_eq!(info.hostname.as_deref(), Some("core-sw-01"));
    }

    #[test]
    fn test_parse_empty() {
        let info = DeviceInfo::parse("", "");
        assert_eq!(info.network_os, "aos");
        assert!(info.version.is_none());
        assert!(info.image.is_none());
        assert!(info.model.is_none());
        assert!(info.hostname.is_none());
    }

    #[test]
    fn test_image_needs_directory() {
        let info = DeviceInfo::parse("Uos.img 8.9.221.R03", "");
        assert!(info.image.is_none());
        assert_eq!(info.version.as_deref(), Some("8.9.221.R03"));
    }

    #[test]
    fn test_serialized_keys() {
        let value = serde_json::to_value(DeviceInfo::parse(MICROCODE, "")).unwrap();
        assert_eq!(value["network_os"], "aos");
        assert_eq!(value["network_os_version"], "8.9.221.R03");
        assert!(value.get("network_os_hostname").is_none());
    }
}
