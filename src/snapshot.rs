use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::build::{Build, BuildCache};
use crate::error::{BuildLensError, Result};

/// Builds as exported from a CI provider at one point in time.
///
/// Accepted on disk either as a bare list of builds or as a document with an
/// `updated-at` timestamp next to the `builds` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSnapshot {
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub builds: Vec<Build>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    List(Vec<Build>),
    Snapshot(BuildSnapshot),
}

impl From<SnapshotDocument> for BuildSnapshot {
    fn from(document: SnapshotDocument) -> Self {
        match document {
            SnapshotDocument::List(builds) => BuildSnapshot {
                updated_at: None,
                builds,
            },
            SnapshotDocument::Snapshot(snapshot) => snapshot,
        }
    }
}

impl BuildSnapshot {
    /// Reads a snapshot file, choosing JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, has an unsupported extension or does
    /// not contain builds.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        let document: SnapshotDocument = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
            other => {
                return Err(BuildLensError::Config(format!(
                    "unsupported build file extension {:?} for {}",
                    other.unwrap_or_default(),
                    path.display()
                )))
            }
        };

        let snapshot = BuildSnapshot::from(document);
        info!(
            "Loaded {} builds from {}",
            snapshot.builds.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// In-memory source holding these builds.
    ///
    /// Without an `updated-at` timestamp the time of the call is used.
    pub fn into_cache(self) -> BuildCache {
        let updated_at = self.updated_at.unwrap_or_else(Utc::now);
        debug!("Build cache stamped {updated_at}");

        let mut cache = BuildCache::new();
        cache.replace(self.builds, updated_at);
        cache
    }
}

/// Reads only the builds of a snapshot file.
///
/// # Errors
///
/// See [`BuildSnapshot::load`].
pub fn load_builds(path: &Path) -> Result<Vec<Build>> {
    BuildSnapshot::load(path).map(|snapshot| snapshot.builds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::test_support::utc;
    use crate::build::{BuildSource, BuildStatus};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JSON_LIST: &str = r#"[
        {
            "id": "1",
            "status": "failed",
            "queue-time": "2020-06-17T14:00:00Z",
            "branch-full-name": "refs/heads/main",
            "definition": { "id": "ci", "name": "CI" },
            "source": { "id": "azure", "name": "Azure DevOps" }
        },
        {
            "id": "2",
            "branch-full-name": "refs/heads/dev",
            "definition": { "id": "ci", "name": "CI" },
            "source": { "id": "azure", "name": "Azure DevOps" }
        }
    ]"#;

    fn file_with(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn loads_json_list() {
        let file = file_with(".json", JSON_LIST);

        let builds = load_builds(file.path()).unwrap();
        assert_eq!(builds.len(), 2);
        assert_eq!(builds[0].status, BuildStatus::Failed);
        assert_eq!(builds[0].queue_time, Some(utc(2020, 6, 17, 14)));
        assert_eq!(builds[1].status, BuildStatus::None);
    }

    #[test]
    fn loads_yaml_document_with_timestamp() {
        let yaml = r"
updated-at: 2020-06-18T09:00:00Z
builds:
  - id: '7'
    status: partially-succeeded
    branch-full-name: main
    definition: { id: nightly, name: Nightly }
    source: { id: gitlab, name: GitLab }
";
        let file = file_with(".yml", yaml);

        let snapshot = BuildSnapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.updated_at, Some(utc(2020, 6, 18, 9)));
        assert_eq!(snapshot.builds[0].status, BuildStatus::PartiallySucceeded);

        let cache = snapshot.into_cache();
        assert_eq!(cache.last_updated(), Some(utc(2020, 6, 18, 9)));
        assert_eq!(cache.cached_builds().len(), 1);
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = file_with(".csv", "id,status");
        assert!(matches!(
            load_builds(file.path()),
            Err(BuildLensError::Config(_))
        ));
    }

    #[test]
    fn reports_malformed_json() {
        let file = file_with(".json", "{ not json");
        assert!(matches!(load_builds(file.path()), Err(BuildLensError::Json(_))));
    }

    #[test]
    fn reports_missing_file() {
        let result = load_builds(Path::new("does-not-exist.json"));
        assert!(matches!(result, Err(BuildLensError::Io(_))));
    }
}
