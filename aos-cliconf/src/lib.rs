//! # aos-cliconf
//!
//! CLI adapter for Alcatel-Lucent Enterprise AOS switches.
//!
//! aos-cliconf runs CLI commands on a switch through a caller-supplied
//! [`Transport`], waits for conditionals on their output, fetches and caches
//! configurations, and diffs a candidate configuration against the running
//! one.
//!
//! ## Features
//!
//! - Wait-for conditionals (`result[0] contains ...`) with retry and interval
//! - Config tree parsing and line/strict/exact diffing with line, block or
//!   whole-config output
//! - JSON output formatting (`| json`, versioned)
//! - Device facts and a capability report
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aos_cliconf::{AosDriverBuilder, CommandTask};
//!
//! # async fn example(transport: impl aos_cliconf::Transport) -> aos_cliconf::Result<()> {
//! let mut driver = AosDriverBuilder::new(transport).build();
//!
//! let task = CommandTask::from_json(
//!     r#"{"commands": ["show microcode"], "wait_for": ["result[0] contains Alcatel-Lucent"]}"#,
//! )?;
//! let result = task.run(&mut driver).await?;
//! println!("{:?}", result.stdout_lines);
//! # Ok(())
//! # }
//! ```

pub mod conditional;
pub mod config;
pub mod driver;
pub mod error;
pub mod platform;
pub mod task;
pub mod transport;
pub mod utils;

// Re-export main types for convenience
pub use conditional::Conditional;
pub use config::{ConfigTree, DiffMatch, DiffOptions, DiffReplace, diff};
pub use driver::{
    AosDriver, AosDriverBuilder, Command, Driver, MatchPolicy, Output, Response, WaitFor,
};
pub use error::{Error, Result};
pub use platform::{Capabilities, DeviceInfo};
pub use task::{CommandTask, TaskParams, TaskResult};
pub use transport::Transport;
