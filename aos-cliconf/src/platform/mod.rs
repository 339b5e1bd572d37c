//! Platform facts for Alcatel-Lucent Enterprise AOS switches.
//!
//! What the device is ([`DeviceInfo`]) and what the adapter can do with it
//! ([`Capabilities`]).

mod capabilities;
mod device_info;

pub use capabilities::{Capabilities, DeviceOperations, OptionValues, RPC};
pub use device_info::{DEVICE_INFO_COMMANDS, DeviceInfo};
