//! Indentation-based configuration model.
//!
//! A configuration blob is split into lines and each non-ignored line becomes
//! a [`ConfigLine`]. Indentation decides nesting: a line indented deeper than
//! the previous one becomes its child, and dedenting walks back up the
//! ancestor stack. All lines are owned by the [`ConfigTree`] in source order;
//! lines refer to their parent and children by position in that order.
//!
//! ```text
//! vlan 10 admin-state enable        depth 0
//! ip interface "mgmt"               depth 0
//!    address 10.0.0.1               depth 1  (parent: ip interface "mgmt")
//!    vlan 10                        depth 1  (parent: ip interface "mgmt")
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Lines starting with one of these tokens are comments.
const COMMENT_TOKENS: &[&str] = &["#", "!", "/*", "*/", "echo"];

/// Banner lines some devices print around configuration output.
static BANNER_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^Using \d+ out of \d+ bytes",
        r"^Building configuration",
        r"^Current configuration : \d+ bytes",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Characters stripped before deciding whether a line carries content.
const BRACES: &[char] = &['{', '}', ';'];

/// Rules deciding which lines are dropped while parsing.
///
/// Comments and banner lines are always dropped. Extra patterns are matched
/// against the start of the stripped line text.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<Regex>,
}

impl IgnoreRules {
    /// Compile user-supplied ignore patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a pattern is not a valid regex.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{p})")).map_err(|e| {
                    Error::invalid_input(format!("invalid ignore_lines pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Check whether a stripped line should be dropped.
    pub fn ignores(&self, text: &str) -> bool {
        COMMENT_TOKENS.iter().any(|t| text.starts_with(t))
            || BANNER_LINES.iter().any(|re| re.is_match(text))
            || self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// One line of device configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    id: usize,
    raw: String,
    text: String,
    indent: usize,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl ConfigLine {
    /// Position of this line in its tree.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The line as it appeared in the source, indentation included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The line with surrounding whitespace removed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Leading whitespace width in the source.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Nesting level (0 for top-level lines).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Position of the parent line, `None` for top-level lines.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Positions of the direct children, in source order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Whether this line has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Ordered configuration lines parsed from one text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    lines: Vec<ConfigLine>,
}

impl ConfigTree {
    /// Parse configuration text, dropping only comments and banner lines.
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, &IgnoreRules::default())
    }

    /// Parse configuration text with custom ignore rules.
    pub fn parse_with(text: &str, rules: &IgnoreRules) -> Self {
        let mut lines: Vec<ConfigLine> = Vec::new();
        let mut ancestors: Vec<usize> = Vec::new();
        let mut indents: Vec<usize> = vec![0];

        for raw in text.split('\n') {
            let raw = raw.trim_end_matches('\r');
            let content = raw.replace(BRACES, "");
            let content = content.trim();
            if content.is_empty() || rules.ignores(content) {
                continue;
            }

            let id = lines.len();
            let indent = raw.len() - raw.trim_start().len();
            let mut line = ConfigLine {
                id,
                raw: raw.to_string(),
                text: raw.trim().to_string(),
                indent,
                depth: 0,
                parent: None,
                children: Vec::new(),
            };

            if indent == 0 {
                ancestors.clear();
                ancestors.push(id);
                indents.truncate(1);
                lines.push(line);
                continue;
            }

            while indents.last().is_some_and(|&i| i > indent) {
                indents.pop();
            }
            if indents.last().is_some_and(|&i| indent > i) {
                indents.push(indent);
            }
            let level = indents.len() - 1;
            line.depth = level;

            // Indented with nothing to hang under (e.g. the first line of the
            // blob). Kept as a parentless line.
            if level > ancestors.len() {
                lines.push(line);
                continue;
            }

            ancestors.truncate(level);
            let parent = ancestors[level - 1];
            line.parent = Some(parent);
            lines[parent].children.push(id);
            ancestors.push(id);
            lines.push(line);
        }

        Self { lines }
    }

    /// All lines in source order.
    pub fn lines(&self) -> impl Iterator<Item = &ConfigLine> {
        self.lines.iter()
    }

    /// Top-level lines in source order.
    pub fn roots(&self) -> impl Iterator<Item = &ConfigLine> {
        self.lines.iter().filter(|l| l.is_root())
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the tree has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get a line by position.
    pub fn get(&self, id: usize) -> Option<&ConfigLine> {
        self.lines.get(id)
    }

    /// Parent of a line.
    pub fn parent_of(&self, id: usize) -> Option<&ConfigLine> {
        self.lines.get(id)?.parent.and_then(|p| self.lines.get(p))
    }

    /// Ancestors of a line, outermost first.
    pub fn ancestors(&self, id: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.lines.get(id).and_then(|l| l.parent);
        while let Some(p) = current {
            chain.push(p);
            current = self.lines[p].parent;
        }
        chain.reverse();
        chain
    }

    /// Ancestor texts followed by the line's own text.
    ///
    /// Two lines from different trees are the same configuration statement
    /// when their paths are equal.
    pub fn path(&self, id: usize) -> Vec<&str> {
        let mut path: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .map(|p| self.lines[p].text.as_str())
            .collect();
        if let Some(line) = self.lines.get(id) {
            path.push(&line.text);
        }
        path
    }

    /// Find the line whose path equals `path`.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        let (last, _) = path.split_last()?;
        self.lines
            .iter()
            .filter(|l| l.text == last.as_ref())
            .find(|l| {
                let candidate = self.path(l.id);
                candidate.len() == path.len()
                    && candidate.iter().zip(path).all(|(a, b)| *a == b.as_ref())
            })
            .map(|l| l.id)
    }

    /// A line and all of its descendants, in source order.
    pub fn block(&self, id: usize) -> Vec<usize> {
        let mut block = Vec::new();
        if id < self.lines.len() {
            self.collect_block(id, &mut block);
            block.sort_unstable();
        }
        block
    }

    fn collect_block(&self, id: usize, out: &mut Vec<usize>) {
        out.push(id);
        for &child in &self.lines[id].children {
            self.collect_block(child, out);
        }
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line.raw)?;
        }
        Ok(())
    }
}
