//! Line-oriented configuration diff.
//!
//! Computes the candidate lines that are missing from (or differ in) a
//! running configuration. The result only ever contains candidate lines,
//! in candidate order, together with the ancestors needed to replay them.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::tree::{ConfigLine, ConfigTree, IgnoreRules};
use crate::error::{Error, Result};

/// How candidate lines are matched against the running configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMatch {
    /// Same path anywhere in the running configuration (default)
    #[default]
    Line,
    /// Same path at the same position
    Strict,
    /// Both configurations identical, otherwise everything differs
    Exact,
    /// No comparison, every candidate line differs
    None,
}

impl DiffMatch {
    /// Every accepted value, in documentation order.
    pub const VALUES: &'static [&'static str] = &["line", "strict", "exact", "none"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffMatch::Line => "line",
            DiffMatch::Strict => "strict",
            DiffMatch::Exact => "exact",
            DiffMatch::None => "none",
        }
    }
}

impl FromStr for DiffMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(DiffMatch::Line),
            "strict" => Ok(DiffMatch::Strict),
            "exact" => Ok(DiffMatch::Exact),
            "none" => Ok(DiffMatch::None),
            _ => Err(Error::invalid_option("diff_match", s, Self::VALUES)),
        }
    }
}

impl fmt::Display for DiffMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the candidate is emitted around a differing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffReplace {
    /// Only the differing lines (default)
    #[default]
    Line,
    /// The whole block of the differing line's outermost parent
    Block,
    /// The entire candidate, no comparison
    Config,
}

impl DiffReplace {
    /// Every accepted value, in documentation order.
    pub const VALUES: &'static [&'static str] = &["line", "block", "config"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffReplace::Line => "line",
            DiffReplace::Block => "block",
            DiffReplace::Config => "config",
        }
    }
}

impl FromStr for DiffReplace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(DiffReplace::Line),
            "block" => Ok(DiffReplace::Block),
            "config" => Ok(DiffReplace::Config),
            _ => Err(Error::invalid_option("diff_replace", s, Self::VALUES)),
        }
    }
}

impl fmt::Display for DiffReplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`diff`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Match policy.
    pub match_policy: DiffMatch,
    /// Replace policy.
    pub replace: DiffReplace,
    /// Patterns for lines excluded from both configurations.
    pub ignore_lines: Vec<String>,
    /// Restrict the comparison to the subtree rooted at this path.
    pub path: Option<Vec<String>>,
}

impl DiffOptions {
    /// Options with default policies (`line`/`line`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from raw `diff_match`/`diff_replace` strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if either value is not recognised.
    pub fn parse(diff_match: &str, diff_replace: &str) -> Result<Self> {
        Ok(Self {
            match_policy: diff_match.parse()?,
            replace: diff_replace.parse()?,
            ..Self::default()
        })
    }

    /// Set the match policy.
    pub fn with_match(mut self, policy: DiffMatch) -> Self {
        self.match_policy = policy;
        self
    }

    /// Set the replace policy.
    pub fn with_replace(mut self, replace: DiffReplace) -> Self {
        self.replace = replace;
        self
    }

    /// Add an ignore pattern.
    pub fn with_ignore_line(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_lines.push(pattern.into());
        self
    }

    /// Restrict the diff to a subtree.
    pub fn with_path<S: Into<String>>(mut self, path: impl IntoIterator<Item = S>) -> Self {
        self.path = Some(path.into_iter().map(Into::into).collect());
        self
    }
}

/// Candidate lines that differ from the running configuration.
#[derive(Debug, Clone)]
pub struct DiffResult {
    candidate: ConfigTree,
    selected: Vec<usize>,
    replace: DiffReplace,
}

impl DiffResult {
    /// The differing lines, in candidate order.
    pub fn lines(&self) -> impl Iterator<Item = &ConfigLine> {
        self.selected.iter().filter_map(|&id| self.candidate.get(id))
    }

    /// The replace policy that produced this result.
    pub fn replace(&self) -> DiffReplace {
        self.replace
    }

    /// The parsed candidate the lines belong to.
    pub fn candidate(&self) -> &ConfigTree {
        &self.candidate
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Render as commands: one stripped line per entry.
    pub fn to_commands(&self) -> String {
        self.lines().map(ConfigLine::text).collect::<Vec<_>>().join("\n")
    }

    /// Render as configuration: raw lines with their indentation.
    pub fn to_config(&self) -> String {
        self.lines().map(ConfigLine::raw).collect::<Vec<_>>().join("\n")
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_commands())
    }
}

/// Compute the lines of `candidate` that are not in `running`.
///
/// A missing or empty `running` makes every candidate line different.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `candidate` is `None`, an ignore pattern is
///   not a valid regex, or the scope path does not exist in the candidate.
pub fn diff(
    candidate: Option<&str>,
    running: Option<&str>,
    options: &DiffOptions,
) -> Result<DiffResult> {
    let candidate = candidate.ok_or_else(|| {
        Error::invalid_input("candidate configuration is required to generate diff")
    })?;

    let rules = IgnoreRules::new(&options.ignore_lines)?;

    // The full candidate is returned untouched by ignore patterns.
    if options.replace == DiffReplace::Config {
        let cand = ConfigTree::parse(candidate);
        debug!("diff: replace=config, returning {} candidate lines", cand.len());
        let selected = (0..cand.len()).collect();
        return Ok(DiffResult {
            candidate: cand,
            selected,
            replace: options.replace,
        });
    }

    let cand = ConfigTree::parse_with(candidate, &rules);
    debug!(
        "diff: {} candidate lines, match={}, replace={}",
        cand.len(),
        options.match_policy,
        options.replace
    );

    let cand_scope = match &options.path {
        Some(path) => {
            let root = cand.find(path).ok_or_else(|| {
                Error::invalid_input(format!("path {path:?} does not exist in config"))
            })?;
            cand.block(root)
        }
        None => (0..cand.len()).collect(),
    };

    let running = running.filter(|r| !r.trim().is_empty());
    let differing = match (running, options.match_policy) {
        (None, _) | (_, DiffMatch::None) => cand_scope.clone(),
        (Some(running), policy) => {
            let run = ConfigTree::parse_with(running, &rules);
            let run_scope = match &options.path {
                Some(path) => run.find(path).map(|root| run.block(root)).unwrap_or_default(),
                None => (0..run.len()).collect(),
            };
            compare(&cand, &cand_scope, &run, &run_scope, policy)
        }
    };

    trace!("diff: {} differing lines before expansion", differing.len());

    let selected = expand(&cand, &cand_scope, &differing, options.replace);
    Ok(DiffResult {
        candidate: cand,
        selected,
        replace: options.replace,
    })
}

/// Differing candidate lines for a comparing match policy.
fn compare(
    cand: &ConfigTree,
    cand_scope: &[usize],
    run: &ConfigTree,
    run_scope: &[usize],
    policy: DiffMatch,
) -> Vec<usize> {
    let same_at = |i: usize, id: usize| {
        run_scope
            .get(i)
            .is_some_and(|&rid| run.path(rid) == cand.path(id))
    };

    match policy {
        DiffMatch::Line => {
            let known: HashSet<Vec<&str>> = run_scope.iter().map(|&id| run.path(id)).collect();
            cand_scope
                .iter()
                .copied()
                .filter(|&id| !known.contains(&cand.path(id)))
                .collect()
        }
        DiffMatch::Strict => cand_scope
            .iter()
            .enumerate()
            .filter(|&(i, &id)| !same_at(i, id))
            .map(|(_, &id)| id)
            .collect(),
        DiffMatch::Exact => {
            let identical = cand_scope.len() == run_scope.len()
                && cand_scope.iter().enumerate().all(|(i, &id)| same_at(i, id));
            if identical { Vec::new() } else { cand_scope.to_vec() }
        }
        DiffMatch::None => cand_scope.to_vec(),
    }
}

/// Apply the replace policy and pull in ancestors, keeping candidate order.
fn expand(
    cand: &ConfigTree,
    scope: &[usize],
    differing: &[usize],
    replace: DiffReplace,
) -> Vec<usize> {
    let in_scope: HashSet<usize> = scope.iter().copied().collect();
    let mut selected = BTreeSet::new();

    for &id in differing {
        let anchor = match replace {
            DiffReplace::Block => cand
                .ancestors(id)
                .into_iter()
                .find(|p| in_scope.contains(p))
                .unwrap_or(id),
            _ => id,
        };

        selected.extend(cand.ancestors(anchor));
        match replace {
            DiffReplace::Block => selected.extend(cand.block(anchor)),
            _ => {
                selected.insert(id);
            }
        }
    }

    selected.into_iter().collect()
}
