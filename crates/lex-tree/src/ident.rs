//! Hierarchical ident paths such as `/us/usc/t26/s501/c/3`.
//!
//! A path's parent is the path with its last segment removed. Paths order
//! segment by segment; inside a segment, runs of digits compare by numeric
//! value so that `s2` sorts before `s10`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// A parsed `/`-delimited ident path.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentPath {
    raw: String,
    segments: Vec<String>,
    absolute: bool,
}

impl IdentPath {
    /// Parse a path. Empty paths and empty segments (`a//b`, `a/`) are rejected.
    pub fn parse(input: &str) -> TreeResult<Self> {
        let invalid = |reason: &str| TreeError::InvalidIdent {
            ident: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let absolute = trimmed.starts_with('/');
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(invalid("path has no segments"));
        }

        let segments: Vec<String> = body.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(invalid("empty path segment"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
            absolute,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn last_segment(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The path with its last segment stripped; `None` for single-segment paths.
    pub fn parent(&self) -> Option<IdentPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        let joined = segments.join("/");
        let raw = if self.absolute { format!("/{joined}") } else { joined };
        Some(Self {
            raw,
            segments,
            absolute: self.absolute,
        })
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &IdentPath) -> bool {
        self.absolute == other.absolute
            && self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }
}

impl Ord for IdentPath {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match compare_segment(a, b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        self.segments
            .len()
            .cmp(&other.segments.len())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for IdentPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for IdentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentPath({})", self.raw)
    }
}

impl fmt::Display for IdentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for IdentPath {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IdentPath {
    type Error = TreeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<IdentPath> for String {
    fn from(path: IdentPath) -> Self {
        path.raw
    }
}

/// Natural ordering of one segment: digit runs by value, other runs lexically.
fn compare_segment(a: &str, b: &str) -> Ordering {
    let mut ra = Runs::new(a);
    let mut rb = Runs::new(b);
    loop {
        match (ra.next(), rb.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => compare_numeric(x, y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit strings by value without parsing (no overflow).
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Splits a segment into alternating digit / non-digit runs.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(run)
    }
}
