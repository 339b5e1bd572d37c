//! Configuration model and diffing.
//!
//! Configuration text is parsed into a [`ConfigTree`] of indented lines, and
//! two trees are compared with [`diff`] under a match and replace policy.

mod diff;
mod tree;

pub use diff::{DiffMatch, DiffOptions, DiffReplace, DiffResult, diff};
pub use tree::{ConfigLine, ConfigTree, IgnoreRules};
