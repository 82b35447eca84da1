use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::build::{Build, BuildStatus};
use crate::locale::Locale;
use crate::search::{SearchCriteriaSuggestion, SpecificSearch};
use crate::tree::{
    BuildNode, BuildTree, BuildsDelta, GroupKind, PartialSucceededTreatmentMode, TreeNode,
};

#[derive(Debug, Serialize)]
pub struct TreeReport {
    pub grouping: String,
    pub generated_at: DateTime<Utc>,
    pub total_builds: usize,
    pub nodes: Vec<NodeReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeReport {
    Group {
        kind: GroupKind,
        key: String,
        label: String,
        status: BuildStatus,
        build_count: usize,
        children: Vec<NodeReport>,
    },
    Build(BuildSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub id: String,
    pub cache_key: String,
    pub definition: String,
    pub branch: String,
    pub source: String,
    pub status: BuildStatus,
    pub progress: u8,
    pub queue_time: Option<DateTime<Utc>>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeltaReport {
    pub partial_succeeded_treatment: PartialSucceededTreatmentMode,
    pub succeeded: Vec<BuildSummary>,
    pub failed: Vec<BuildSummary>,
    pub cancelled: Vec<BuildSummary>,
}

#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub text: String,
    pub blocks: Vec<BlockReport>,
    pub total_builds: usize,
    pub matched: Vec<BuildSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub keyword: String,
    pub entered_text: String,
    pub search_term: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    pub text: String,
    pub is_keyword: bool,
}

impl TreeReport {
    pub fn new(tree: &BuildTree) -> Self {
        Self {
            grouping: tree.grouping().to_string(),
            generated_at: Utc::now(),
            total_builds: tree.build_count(),
            nodes: tree.children().iter().map(NodeReport::from).collect(),
        }
    }
}

impl From<&TreeNode> for NodeReport {
    fn from(node: &TreeNode) -> Self {
        match node {
            TreeNode::Group(group) => NodeReport::Group {
                kind: group.kind(),
                key: group.key().to_string(),
                label: group.label().to_string(),
                status: node.aggregate_status(),
                build_count: node.build_count(),
                children: node.children().iter().map(NodeReport::from).collect(),
            },
            TreeNode::Build(leaf) => NodeReport::Build(BuildSummary::from(leaf)),
        }
    }
}

impl From<&Build> for BuildSummary {
    fn from(build: &Build) -> Self {
        Self {
            id: build.id.clone(),
            cache_key: build.cache_key(),
            definition: build.definition.name.clone(),
            branch: build.branch_name().to_string(),
            source: build.source.name.clone(),
            status: build.status,
            progress: build.progress,
            queue_time: build.queue_time,
            requested_by: build.requested_by.clone(),
        }
    }
}

/// Leaves report their refreshed values rather than those of the wrapped build.
impl From<&BuildNode> for BuildSummary {
    fn from(leaf: &BuildNode) -> Self {
        Self {
            status: leaf.status(),
            progress: leaf.progress(),
            queue_time: leaf.queue_time(),
            ..BuildSummary::from(leaf.build())
        }
    }
}

impl DeltaReport {
    pub fn new(delta: &BuildsDelta, mode: PartialSucceededTreatmentMode) -> Self {
        let summarize = |leaves: &[BuildNode]| -> Vec<BuildSummary> {
            leaves.iter().map(BuildSummary::from).collect()
        };
        Self {
            partial_succeeded_treatment: mode,
            succeeded: summarize(delta.succeeded()),
            failed: summarize(delta.failed()),
            cancelled: summarize(delta.cancelled()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.cancelled.is_empty()
    }
}

impl SearchReport {
    pub fn new(search: &SpecificSearch, builds: &[Build], locale: Locale) -> Self {
        Self {
            text: search.text().to_string(),
            blocks: search
                .blocks()
                .iter()
                .map(|block| BlockReport {
                    keyword: block.criteria().keyword(locale),
                    entered_text: block.entered_text().to_string(),
                    search_term: block.search_term().to_string(),
                })
                .collect(),
            total_builds: builds.len(),
            matched: builds
                .iter()
                .filter(|build| search.is_build_included(build))
                .map(BuildSummary::from)
                .collect(),
        }
    }
}

impl From<&SearchCriteriaSuggestion> for SuggestionReport {
    fn from(suggestion: &SearchCriteriaSuggestion) -> Self {
        Self {
            text: suggestion.text().to_string(),
            is_keyword: suggestion.is_keyword(),
        }
    }
}
