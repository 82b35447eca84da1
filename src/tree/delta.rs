use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::build::BuildStatus;
use crate::error::BuildLensError;

use super::node::{BuildNode, BuildTree};

/// How builds that partially succeeded are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialSucceededTreatmentMode {
    #[default]
    TreatAsSucceeded,
    TreatAsFailed,
    Ignore,
}

impl PartialSucceededTreatmentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PartialSucceededTreatmentMode::TreatAsSucceeded => "treat-as-succeeded",
            PartialSucceededTreatmentMode::TreatAsFailed => "treat-as-failed",
            PartialSucceededTreatmentMode::Ignore => "ignore",
        }
    }
}

impl fmt::Display for PartialSucceededTreatmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartialSucceededTreatmentMode {
    type Err = BuildLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "treat-as-succeeded" | "succeeded" => Ok(PartialSucceededTreatmentMode::TreatAsSucceeded),
            "treat-as-failed" | "failed" => Ok(PartialSucceededTreatmentMode::TreatAsFailed),
            "ignore" => Ok(PartialSucceededTreatmentMode::Ignore),
            other => Err(BuildLensError::Config(format!(
                "unknown partial succeeded treatment '{other}'"
            ))),
        }
    }
}

/// Status of every build leaf of a tree, keyed by [`crate::build::Build::cache_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot(HashMap<String, BuildStatus>);

impl StatusSnapshot {
    pub fn capture<'a, I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = &'a BuildNode>,
    {
        Self(
            leaves
                .into_iter()
                .map(|leaf| (leaf.build().cache_key(), leaf.status()))
                .collect(),
        )
    }

    pub fn get(&self, cache_key: &str) -> Option<BuildStatus> {
        self.0.get(cache_key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, BuildStatus)> for StatusSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, BuildStatus)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl BuildTree {
    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::capture(self.leaves())
    }
}

/// Builds that changed into a terminal status between two refreshes.
#[derive(Debug, Clone, Default)]
pub struct BuildsDelta {
    succeeded: Vec<BuildNode>,
    failed: Vec<BuildNode>,
    cancelled: Vec<BuildNode>,
}

impl BuildsDelta {
    /// Classifies every leaf against its status in `previous`.
    ///
    /// A build missing from `previous` is compared against [`BuildStatus::None`], so
    /// a build seen for the first time in a terminal status is reported.
    pub fn compute<'a, I>(
        current: I,
        previous: &StatusSnapshot,
        mode: PartialSucceededTreatmentMode,
    ) -> Self
    where
        I: IntoIterator<Item = &'a BuildNode>,
    {
        let mut delta = Self::default();

        for leaf in current {
            let before = previous
                .get(&leaf.build().cache_key())
                .unwrap_or_default();

            let Some(now) = effective_status(leaf.status(), mode) else {
                continue;
            };

            let bucket = match now {
                BuildStatus::Succeeded if before != BuildStatus::Succeeded => &mut delta.succeeded,
                BuildStatus::Failed if before != BuildStatus::Failed => &mut delta.failed,
                BuildStatus::Cancelled if before != BuildStatus::Cancelled => &mut delta.cancelled,
                _ => continue,
            };
            bucket.push(leaf.clone());
        }

        debug!(
            "Delta: {} succeeded, {} failed, {} cancelled",
            delta.succeeded.len(),
            delta.failed.len(),
            delta.cancelled.len()
        );

        delta
    }

    /// Delta of `tree` against the snapshot of a previous tree.
    pub fn between(
        tree: &BuildTree,
        previous: &StatusSnapshot,
        mode: PartialSucceededTreatmentMode,
    ) -> Self {
        Self::compute(tree.leaves(), previous, mode)
    }

    pub fn succeeded(&self) -> &[BuildNode] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[BuildNode] {
        &self.failed
    }

    pub fn cancelled(&self) -> &[BuildNode] {
        &self.cancelled
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.cancelled.is_empty()
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.cancelled.len()
    }

    pub fn clear(&mut self) {
        self.succeeded.clear();
        self.failed.clear();
        self.cancelled.clear();
    }

    /// Forgets `node`, e.g. once a notification for it was shown.
    pub fn remove_node(&mut self, node: &BuildNode) {
        for bucket in [&mut self.succeeded, &mut self.failed, &mut self.cancelled] {
            bucket.retain(|n| n != node);
        }
    }
}

fn effective_status(
    status: BuildStatus,
    mode: PartialSucceededTreatmentMode,
) -> Option<BuildStatus> {
    match (status, mode) {
        (BuildStatus::PartiallySucceeded, PartialSucceededTreatmentMode::TreatAsSucceeded) => {
            Some(BuildStatus::Succeeded)
        }
        (BuildStatus::PartiallySucceeded, PartialSucceededTreatmentMode::TreatAsFailed) => {
            Some(BuildStatus::Failed)
        }
        (BuildStatus::PartiallySucceeded, PartialSucceededTreatmentMode::Ignore) => None,
        (status, _) => Some(status),
    }
}
