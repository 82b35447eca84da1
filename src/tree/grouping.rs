use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildLensError;

/// Dimension a tree level groups builds by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupDefinition {
    /// No level is introduced at this position.
    None,
    Source,
    Branch,
    #[serde(alias = "definition")]
    BuildDefinition,
    Status,
}

impl GroupDefinition {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupDefinition::None => "none",
            GroupDefinition::Source => "source",
            GroupDefinition::Branch => "branch",
            GroupDefinition::BuildDefinition => "definition",
            GroupDefinition::Status => "status",
        }
    }
}

impl fmt::Display for GroupDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupDefinition {
    type Err = BuildLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(GroupDefinition::None),
            "source" => Ok(GroupDefinition::Source),
            "branch" => Ok(GroupDefinition::Branch),
            "definition" | "build-definition" | "builddefinition" => {
                Ok(GroupDefinition::BuildDefinition)
            }
            "status" => Ok(GroupDefinition::Status),
            other => Err(BuildLensError::UnknownGrouping(other.to_string())),
        }
    }
}

/// Ordered dimensions defining the shape of a build tree.
///
/// Duplicates are not rejected; a repeated dimension re-partitions the already
/// grouped subset and produces a redundant single-child level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingSpec(Vec<GroupDefinition>);

impl GroupingSpec {
    pub fn new(definitions: impl IntoIterator<Item = GroupDefinition>) -> Self {
        Self(definitions.into_iter().collect())
    }

    pub fn definitions(&self) -> &[GroupDefinition] {
        &self.0
    }

    /// Number of group levels between the root and the build leaves.
    pub fn depth(&self) -> usize {
        self.0
            .iter()
            .filter(|d| **d != GroupDefinition::None)
            .count()
    }
}

impl From<Vec<GroupDefinition>> for GroupingSpec {
    fn from(definitions: Vec<GroupDefinition>) -> Self {
        Self(definitions)
    }
}

impl fmt::Display for GroupingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|d| d.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Parses a comma separated list such as `"source,branch,definition"`.
impl FromStr for GroupingSpec {
    type Err = BuildLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
