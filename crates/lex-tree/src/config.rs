use serde::{Deserialize, Serialize};

use crate::chain::DEFAULT_MAX_DEPTH;
use crate::window::DEFAULT_RADIUS;

/// Configuration for building the partial tree around one amendment target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialTreeConfig {
    /// Siblings kept on each side of every chain node.
    pub window_radius: usize,
    /// Maximum parent hops before a walk is treated as cyclic.
    pub max_depth: usize,
    /// Whether the full subtree below the target is materialized.
    pub include_target_subtree: bool,
}

impl Default for PartialTreeConfig {
    fn default() -> Self {
        Self {
            window_radius: DEFAULT_RADIUS,
            max_depth: DEFAULT_MAX_DEPTH,
            include_target_subtree: true,
        }
    }
}

impl PartialTreeConfig {
    /// Only the chain itself: no siblings, no subtree.
    pub fn chain_only() -> Self {
        Self {
            window_radius: 0,
            include_target_subtree: false,
            ..Default::default()
        }
    }
}
