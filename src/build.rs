use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BuildLensError;

/// Possible statuses of a build, ordered by severity. Higher is more important.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    /// Unknown status.
    #[default]
    None,
    Cancelled,
    /// Queued but not started yet.
    Pending,
    Running,
    Succeeded,
    /// Completed with warnings.
    PartiallySucceeded,
    Failed,
}

impl BuildStatus {
    pub const ALL: [BuildStatus; 7] = [
        BuildStatus::None,
        BuildStatus::Cancelled,
        BuildStatus::Pending,
        BuildStatus::Running,
        BuildStatus::Succeeded,
        BuildStatus::PartiallySucceeded,
        BuildStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::None => "None",
            BuildStatus::Cancelled => "Cancelled",
            BuildStatus::Pending => "Pending",
            BuildStatus::Running => "Running",
            BuildStatus::Succeeded => "Succeeded",
            BuildStatus::PartiallySucceeded => "PartiallySucceeded",
            BuildStatus::Failed => "Failed",
        }
    }

    /// Whether a build in this status will not change anymore.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildStatus::Cancelled
                | BuildStatus::Succeeded
                | BuildStatus::PartiallySucceeded
                | BuildStatus::Failed
        )
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = BuildLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        BuildStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == normalized)
            .ok_or_else(|| BuildLensError::Config(format!("unknown build status '{s}'")))
    }
}

/// Pipeline or job definition a build was started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDefinition {
    /// Stable identifier within the owning source
    pub id: String,
    /// Human readable name
    pub name: String,
}

/// Connection or project a build was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Stable identifier of the connection/project
    pub id: String,
    /// Human readable name
    pub name: String,
}

/// A single build as reported by a CI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Build {
    /// Provider assigned identifier, unique within its source
    pub id: String,
    #[serde(default)]
    pub status: BuildStatus,
    #[serde(default)]
    pub queue_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_changed_time: Option<DateTime<Utc>>,
    /// Completion percentage, 0 to 100
    #[serde(default)]
    pub progress: u8,
    /// Full git ref, e.g. "refs/heads/main"
    pub branch_full_name: String,
    pub definition: BuildDefinition,
    pub source: Source,
    #[serde(default)]
    pub requested_by: Option<String>,
}

impl Build {
    /// Key that stays the same for a build across provider refreshes.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.source.id, self.definition.id, self.id)
    }

    /// Branch name without the `refs/heads/` style prefix.
    pub fn branch_name(&self) -> &str {
        const PREFIXES: [&str; 3] = ["refs/heads/", "refs/pull/", "refs/tags/"];

        PREFIXES
            .iter()
            .find_map(|prefix| self.branch_full_name.strip_prefix(prefix))
            .unwrap_or(self.branch_full_name.as_str())
    }
}

/// Provides the latest known set of builds.
///
/// Search criteria refresh their suggestion caches whenever `last_updated` changes.
pub trait BuildSource {
    fn cached_builds(&self) -> &[Build];

    fn last_updated(&self) -> Option<DateTime<Utc>>;
}

/// In-memory [`BuildSource`] replaced wholesale on every refresh.
#[derive(Debug, Default)]
pub struct BuildCache {
    builds: Vec<Build>,
    last_updated: Option<DateTime<Utc>>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, builds: Vec<Build>, updated_at: DateTime<Utc>) {
        self.builds = builds;
        self.last_updated = Some(updated_at);
    }
}

impl BuildSource for BuildCache {
    fn cached_builds(&self) -> &[Build] {
        &self.builds
    }

    fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
