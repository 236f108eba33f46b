//! Concurrent merge pipeline.
//!
//! Partial trees are built in parallel against one shared, immutable record
//! snapshot. The resulting contributions are split into disjoint shards, each
//! shard is folded into its own local forest, and the local forests are then
//! reduced one after another. No map is ever shared between workers.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use lex_diff::{DiffConfig, FieldDiffer};
use lex_tree::{PartialTreeConfig, RecordSet, TreeError};
use lex_types::{ContentId, DiffId, DiffRecord};

use crate::contribution::Contribution;
use crate::error::{MergeError, MergeResult};
use crate::forest::{merge, MergedForest};

/// Default number of local forests folded in parallel.
pub const DEFAULT_SHARDS: usize = 4;

/// Configuration for one pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub partial: PartialTreeConfig,
    pub diff: DiffConfig,
    /// Number of disjoint contribution groups folded concurrently.
    pub shards: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            partial: PartialTreeConfig::default(),
            diff: DiffConfig::default(),
            shards: DEFAULT_SHARDS,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> MergeResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MergeResult<()> {
        if self.shards == 0 {
            return Err(MergeError::Config("shards must be at least 1".into()));
        }
        self.diff.validate()?;
        if self.partial.max_depth == 0 {
            return Err(MergeError::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// An amendment whose partial tree could not be built.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineFailure {
    pub diff_id: DiffId,
    pub target: ContentId,
    pub error: TreeError,
}

/// Everything one pipeline run produced.
#[derive(Clone, Debug, Default)]
pub struct PipelineOutput {
    pub forest: MergedForest,
    /// Sorted by diff id.
    pub failures: Vec<PipelineFailure>,
}

impl PipelineOutput {
    /// Returns `true` if no amendment contributed anything.
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }
}

/// Builds, renders and merges the partial trees of a batch of amendments.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    differ: Arc<FieldDiffer>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> MergeResult<Self> {
        config.validate()?;
        let differ = FieldDiffer::new(config.diff.clone())?;
        Ok(Self {
            config,
            differ: Arc::new(differ),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over `diffs` against `snapshot`.
    ///
    /// Amendments whose target is missing or whose ancestry is cyclic are
    /// reported in [`PipelineOutput::failures`]; the rest are merged. Repeats
    /// of an identical amendment are merged once, and two different
    /// amendments under one diff id fail the whole run.
    pub async fn run(&self, snapshot: Arc<RecordSet>, diffs: Vec<DiffRecord>) -> MergeResult<PipelineOutput> {
        let diffs = dedupe(diffs)?;
        let total = diffs.len();
        let (mut contributions, mut failures) = self.build_all(snapshot, diffs).await?;

        // Join order is arbitrary; diff ids are unique here, so this fixes it.
        contributions.sort_by_key(|c| c.diff_id);
        failures.sort_by_key(|f| f.diff_id);

        let forest = self.fold(contributions).await?;
        info!(
            diffs = total,
            failures = failures.len(),
            nodes = forest.len(),
            "merge pipeline finished"
        );
        Ok(PipelineOutput { forest, failures })
    }

    async fn build_all(
        &self,
        snapshot: Arc<RecordSet>,
        diffs: Vec<DiffRecord>,
    ) -> MergeResult<(Vec<Contribution>, Vec<PipelineFailure>)> {
        let mut builds = JoinSet::new();
        for diff in diffs {
            let snapshot = Arc::clone(&snapshot);
            let differ = Arc::clone(&self.differ);
            let partial = self.config.partial.clone();
            builds.spawn_blocking(move || {
                let result = Contribution::build(&snapshot, &diff, &partial, &differ);
                (diff, result)
            });
        }

        let mut contributions = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = builds.join_next().await {
            let (diff, result) = joined?;
            match result {
                Ok(contribution) => contributions.push(contribution),
                Err(error) => {
                    warn!(diff = %diff.id, target = %diff.content_id, error = %error, "partial tree failed");
                    failures.push(PipelineFailure {
                        diff_id: diff.id,
                        target: diff.content_id,
                        error,
                    });
                }
            }
        }
        Ok((contributions, failures))
    }

    async fn fold(&self, contributions: Vec<Contribution>) -> MergeResult<MergedForest> {
        let groups = shard(contributions, self.config.shards);
        debug!(shards = groups.len(), "folding contribution shards");

        let mut folds = JoinSet::new();
        for group in groups {
            folds.spawn_blocking(move || merge(group));
        }

        let mut forest = MergedForest::new();
        while let Some(local) = folds.join_next().await {
            forest.combine(local?);
        }
        Ok(forest)
    }
}

/// Drop exact repeats, in diff-id order.
fn dedupe(diffs: Vec<DiffRecord>) -> MergeResult<Vec<DiffRecord>> {
    let mut unique: BTreeMap<DiffId, DiffRecord> = BTreeMap::new();
    for diff in diffs {
        match unique.entry(diff.id) {
            Entry::Vacant(slot) => {
                slot.insert(diff);
            }
            Entry::Occupied(slot) if *slot.get() == diff => {
                debug!(diff = %diff.id, "dropping repeated amendment");
            }
            Entry::Occupied(_) => return Err(MergeError::DuplicateDiff(diff.id)),
        }
    }
    Ok(unique.into_values().collect())
}

/// Deal contributions round-robin into at most `shards` non-empty groups.
fn shard(contributions: Vec<Contribution>, shards: usize) -> Vec<Vec<Contribution>> {
    let shards = shards.max(1).min(contributions.len());
    let mut groups: Vec<Vec<Contribution>> = (0..shards).map(|_| Vec::new()).collect();
    for (i, contribution) in contributions.into_iter().enumerate() {
        groups[i % shards].push(contribution);
    }
    groups
}
