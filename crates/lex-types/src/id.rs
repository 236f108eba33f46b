use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identity of a content node (a title, chapter, section, paragraph...).
///
/// Two records carrying the same `ContentId` always denote the same logical
/// node, no matter which fetch or partial tree produced them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(u64);

impl ContentId {
    /// Wrap a raw integer id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContentId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_raw(s).map(Self)
    }
}

/// Identity of one amendment record.
///
/// Several amendments may be anchored at the same [`ContentId`]; the merger
/// tracks which of them touch each node through their `DiffId`s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffId(u64);

impl DiffId {
    /// Wrap a raw integer id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for DiffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiffId({})", self.0)
    }
}

impl fmt::Display for DiffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl From<u64> for DiffId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for DiffId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_raw(s.strip_prefix('d').unwrap_or(s)).map(Self)
    }
}

fn parse_raw(s: &str) -> Result<u64, TypeError> {
    s.trim().parse::<u64>().map_err(|e| TypeError::InvalidId {
        input: s.to_string(),
        reason: e.to_string(),
    })
}
