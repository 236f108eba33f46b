use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};
use crate::word_diff::DEFAULT_MERGE_GAP;

/// Amount subtracted from a diffed node's `order_number`.
pub const DEFAULT_ORDER_NUDGE: f64 = 0.01;

/// Which diff engine compares a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Common prefix/suffix, one replaced region.
    #[default]
    Character,
    /// Index-aligned words with merged edit windows.
    Word,
    /// Minimal word-level edit script.
    Myers,
}

impl std::fmt::Display for DiffMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character => write!(f, "character"),
            Self::Word => write!(f, "word"),
            Self::Myers => write!(f, "myers"),
        }
    }
}

/// Configuration for field diffing and node rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub mode: DiffMode,
    /// Unchanged words allowed inside one merged window (word mode only).
    pub merge_gap: usize,
    /// Subtracted from a diffed node's order so it sorts ahead of its peers.
    pub order_nudge: f64,
    /// Turn citation markup in undiffed content into links.
    pub resolve_citations: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            mode: DiffMode::Character,
            merge_gap: DEFAULT_MERGE_GAP,
            order_nudge: DEFAULT_ORDER_NUDGE,
            resolve_citations: true,
        }
    }
}

impl DiffConfig {
    pub fn with_mode(mut self, mode: DiffMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject an `order_nudge` that is negative or not finite.
    pub fn validate(&self) -> DiffResult<()> {
        if !self.order_nudge.is_finite() || self.order_nudge < 0.0 {
            return Err(DiffError::Config(format!(
                "order_nudge must be a non-negative number, got {}",
                self.order_nudge
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DiffConfig::default();
        assert_eq!(c.mode, DiffMode::Character);
        assert_eq!(c.merge_gap, 3);
        assert_eq!(c.order_nudge, 0.01);
        assert!(c.resolve_citations);
    }

    #[test]
    fn mode_from_toml() {
        let c: DiffConfig = toml::from_str("mode = \"word\"\nmerge_gap = 5").unwrap();
        assert_eq!(c.mode, DiffMode::Word);
        assert_eq!(c.merge_gap, 5);
        assert_eq!(c.order_nudge, DEFAULT_ORDER_NUDGE);
    }

    #[test]
    fn nudge_must_be_finite_and_non_negative() {
        assert!(DiffConfig::default().validate().is_ok());
        for nudge in [-1.0, f64::NAN, f64::INFINITY] {
            let config = DiffConfig {
                order_nudge: nudge,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(DiffError::Config(_))));
        }
        let zero = DiffConfig {
            order_nudge: 0.0,
            ..Default::default()
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(toml::from_str::<DiffConfig>("mode = \"fuzzy\"").is_err());
    }

    #[test]
    fn mode_display_matches_serde_name() {
        for mode in [DiffMode::Character, DiffMode::Word, DiffMode::Myers] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }
}
