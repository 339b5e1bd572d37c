//! Wait-for conditionals evaluated against command responses.
//!
//! A conditional compares one response (optionally a field inside a JSON
//! response) against a literal value:
//!
//! ```text
//! result[0] contains Alcatel-Lucent
//! result1 not contains "Link down"
//! result[0].vlan[0].id eq 10
//! result[2] matches ^\s*Status\s+:\s+UP
//! ```
//!
//! Operators: `eq`/`==`, `ne`/`neq`/`!=`, `gt`/`>`, `ge`/`>=`, `lt`/`<`,
//! `le`/`<=`, `contains`, `matches`. Everything after the operator is the
//! value; single or double quotes group words and are removed.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde_json::Value;

use crate::driver::{Output, Response};
use crate::error::{ConditionalError, Result};

/// Comparison operator of a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    Matches,
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "eq" | "==" => Ok(Operator::Eq),
            "ne" | "neq" | "!=" => Ok(Operator::Ne),
            "gt" | ">" => Ok(Operator::Gt),
            "ge" | ">=" => Ok(Operator::Ge),
            "lt" | "<" => Ok(Operator::Lt),
            "le" | "<=" => Ok(Operator::Le),
            "contains" => Ok(Operator::Contains),
            "matches" => Ok(Operator::Matches),
            _ => Err(()),
        }
    }
}

/// One step into a JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed wait-for conditional.
///
/// Immutable once parsed; [`evaluate`](Self::evaluate) is a pure function of
/// the responses it is given.
#[derive(Debug, Clone)]
pub struct Conditional {
    raw: String,
    index: usize,
    path: Vec<Segment>,
    negate: bool,
    operator: Operator,
    value: String,
    regex: Option<Regex>,
}

impl Conditional {
    /// Parse a conditional expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionalError::Syntax`] when the expression does not
    /// match the grammar, the response index is not a non-negative integer,
    /// the operator is unknown, or a `matches` value is not a valid regex.
    pub fn parse(expression: &str) -> Result<Self> {
        let syntax = |message: String| ConditionalError::Syntax {
            expression: expression.to_string(),
            message,
        };

        let tokens = split_words(expression).map_err(|m| syntax(m.to_string()))?;
        let mut tokens = tokens.into_iter();

        let key = tokens
            .next()
            .ok_or_else(|| syntax("empty expression".to_string()))?;
        let (index, path) = parse_key(&key).map_err(syntax)?;

        let mut op = tokens
            .next()
            .ok_or_else(|| syntax("missing operator".to_string()))?;
        let negate = op == "not";
        if negate {
            op = tokens
                .next()
                .ok_or_else(|| syntax("missing operator after 'not'".to_string()))?;
        }
        let operator: Operator = op
            .parse()
            .map_err(|_| syntax(format!("unknown operator '{op}'")))?;

        let value = tokens.collect::<Vec<_>>().join(" ");
        if value.is_empty() {
            return Err(syntax("missing value".to_string()).into());
        }

        let regex = match operator {
            Operator::Matches => Some(
                Regex::new(&format!("(?m){value}"))
                    .map_err(|e| syntax(format!("invalid regex: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self {
            raw: expression.to_string(),
            index,
            path,
            negate,
            operator,
            value,
            regex,
        })
    }

    /// The source expression.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Index of the response this conditional reads.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Whether the comparison is negated with `not`.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Evaluate against the responses of the current attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionalError::Evaluation`] if the referenced response
    /// does not exist or the JSON path does not resolve.
    pub fn evaluate(&self, responses: &[Response]) -> Result<bool> {
        let response = responses.get(self.index).ok_or_else(|| {
            self.evaluation(format!(
                "result[{}] requested but only {} responses available",
                self.index,
                responses.len()
            ))
        })?;

        let subject = self.resolve(&response.output)?;
        let outcome = self.compare(subject);
        Ok(outcome != self.negate)
    }

    fn evaluation(&self, message: String) -> ConditionalError {
        ConditionalError::Evaluation {
            expression: self.raw.clone(),
            message,
        }
    }

    fn resolve<'a>(&self, output: &'a Output) -> Result<Subject<'a>> {
        if self.path.is_empty() {
            return Ok(match output {
                Output::Text(s) => Subject::Text(s),
                Output::Json(v) => Subject::Json(v),
            });
        }

        let mut current = output.as_json().ok_or_else(|| {
            self.evaluation(format!("result[{}] is text, not structured data", self.index))
        })?;

        for segment in &self.path {
            current = match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(i) => current.get(*i),
            }
            .ok_or_else(|| self.evaluation(format!("no value at {segment:?}")))?;
        }

        Ok(Subject::Json(current))
    }

    fn compare(&self, subject: Subject<'_>) -> bool {
        let expected = self.value.as_str();
        match self.operator {
            Operator::Contains => subject.contains(expected),
            Operator::Matches => self
                .regex
                .as_ref()
                .is_some_and(|re| re.is_match(&subject.text())),
            Operator::Eq => subject.equals(expected),
            Operator::Ne => !subject.equals(expected),
            Operator::Gt => subject.order(expected) == Ordering::Greater,
            Operator::Ge => subject.order(expected) != Ordering::Less,
            Operator::Lt => subject.order(expected) == Ordering::Less,
            Operator::Le => subject.order(expected) != Ordering::Greater,
        }
    }
}

impl FromStr for Conditional {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The value a conditional compares against.
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Text(&'a str),
    Json(&'a Value),
}

impl Subject<'_> {
    fn text(&self) -> String {
        match self {
            Subject::Text(s) => (*s).to_string(),
            Subject::Json(v) => scalar_text(v),
        }
    }

    fn contains(&self, needle: &str) -> bool {
        match self {
            Subject::Text(s) => s.contains(needle),
            Subject::Json(Value::Array(items)) => items.iter().any(|v| scalar_text(v) == needle),
            Subject::Json(Value::Object(map)) => map.contains_key(needle),
            Subject::Json(v) => scalar_text(v).contains(needle),
        }
    }

    fn equals(&self, expected: &str) -> bool {
        if let (Subject::Json(Value::Bool(b)), Some(e)) = (self, parse_bool(expected)) {
            return *b == e;
        }
        let text = self.text();
        match (parse_number(&text), parse_number(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => text == expected,
        }
    }

    fn order(&self, expected: &str) -> Ordering {
        let text = self.text();
        match (parse_number(&text), parse_number(expected)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => text.as_str().cmp(expected),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split on whitespace, grouping quoted runs and dropping the quotes.
fn split_words(input: &str) -> std::result::Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse `resultN` / `result[N]` with an optional JSON path suffix.
fn parse_key(key: &str) -> std::result::Result<(usize, Vec<Segment>), String> {
    let rest = key
        .strip_prefix("result")
        .ok_or_else(|| format!("'{key}' does not reference a result"))?;

    let (index, mut rest) = if let Some(inner) = rest.strip_prefix('[') {
        let end = inner
            .find(']')
            .ok_or_else(|| format!("unclosed '[' in '{key}'"))?;
        (&inner[..end], &inner[end + 1..])
    } else {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (&rest[..end], &rest[end..])
    };

    let index: usize = index
        .parse()
        .map_err(|_| format!("result index '{index}' is not a non-negative integer"))?;

    let mut path = Vec::new();
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            let end = inner
                .find(']')
                .ok_or_else(|| format!("unclosed '[' in '{key}'"))?;
            let part = &inner[..end];
            if part.is_empty() {
                return Err(format!("empty '[]' in '{key}'"));
            }
            path.push(match part.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Key(part.to_string()),
            });
            rest = &inner[end + 1..];
        } else if let Some(inner) = rest.strip_prefix('.') {
            let end = inner.find(['.', '[']).unwrap_or(inner.len());
            if end == 0 {
                return Err(format!("empty field name in '{key}'"));
            }
            path.push(Segment::Key(inner[..end].to_string()));
            rest = &inner[end..];
        } else {
            return Err(format!("unexpected '{rest}' in '{key}'"));
        }
    }

    Ok((index, path))
}
