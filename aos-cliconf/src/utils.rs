//! Small text helpers for AOS command and config handling.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Expand a VLAN range list such as `"1-3,5,10-11"`.
///
/// Parsing stops at the first `none` entry. The result is sorted and
/// free of duplicates.
pub fn vlan_range_to_list(vlans: &str) -> Result<Vec<u16>> {
    let mut result = Vec::new();

    for part in vlans.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part == "none" {
            break;
        }
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_vlan(start)?;
                let end = parse_vlan(end)?;
                result.extend(start..=end);
            }
            None => result.push(parse_vlan(part)?),
        }
    }

    result.sort_unstable();
    result.dedup();
    Ok(result)
}

fn parse_vlan(s: &str) -> Result<u16> {
    s.trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("invalid VLAN id '{s}'")))
}

/// Keep only the slot/port part of an interface name.
///
/// `"GigabitEthernet1/1/2"` becomes `"1/1/2"`.
pub fn interface_number(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_digit() || *c == '/' || *c == '.')
        .collect()
}

/// A unique-enough configuration session name, `aos_<centiseconds>`.
pub fn session_name() -> String {
    let centis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() / 10)
        .unwrap_or_default();
    format!("aos_{centis}")
}
