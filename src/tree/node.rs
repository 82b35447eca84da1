use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::build::{Build, BuildStatus};

use super::grouping::GroupingSpec;

/// Dimension a [`GroupNode`] was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    Source,
    Branch,
    Definition,
    Status,
}

/// Identity of a node among its siblings. Children are never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeIdentity {
    Group(GroupKind, String),
    Build(String),
}

/// Intermediate tree level holding all builds that share one key.
#[derive(Debug, Clone)]
pub struct GroupNode {
    kind: GroupKind,
    key: String,
    label: String,
    depth: usize,
    pub(crate) children: Vec<TreeNode>,
}

impl GroupNode {
    pub(crate) fn new(kind: GroupKind, key: String, label: String, depth: usize) -> Self {
        Self {
            kind,
            key,
            label,
            depth,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Stable grouping key, e.g. the definition id or full branch ref.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name, e.g. the definition name or short branch name.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Leaf wrapping exactly one build.
///
/// Status, progress and timestamps are a snapshot copied from the build and can be
/// refreshed with [`BuildNode::update_with_values_from`] without replacing the node.
#[derive(Debug, Clone)]
pub struct BuildNode {
    build: Build,
    depth: usize,
    status: BuildStatus,
    progress: u8,
    queue_time: Option<DateTime<Utc>>,
    last_changed_time: Option<DateTime<Utc>>,
}

impl BuildNode {
    pub fn new(build: Build, depth: usize) -> Self {
        Self {
            status: build.status,
            progress: build.progress,
            queue_time: build.queue_time,
            last_changed_time: build.last_changed_time,
            build,
            depth,
        }
    }

    pub fn build(&self) -> &Build {
        &self.build
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn status(&self) -> BuildStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn queue_time(&self) -> Option<DateTime<Utc>> {
        self.queue_time
    }

    pub fn last_changed_time(&self) -> Option<DateTime<Utc>> {
        self.last_changed_time
    }

    /// Copies the mutable snapshot from `other`. Identity stays untouched.
    pub fn update_with_values_from(&mut self, other: &BuildNode) {
        self.status = other.status;
        self.progress = other.progress;
        self.queue_time = other.queue_time;
        self.last_changed_time = other.last_changed_time;
    }
}

impl PartialEq for BuildNode {
    fn eq(&self, other: &Self) -> bool {
        self.build.id == other.build.id
    }
}

impl Eq for BuildNode {}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Group(GroupNode),
    Build(BuildNode),
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Group(group) => group.depth,
            TreeNode::Build(leaf) => leaf.depth,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Group(group) => &group.children,
            TreeNode::Build(_) => &[],
        }
    }

    pub fn identity(&self) -> NodeIdentity {
        match self {
            TreeNode::Group(group) => NodeIdentity::Group(group.kind, group.key.clone()),
            TreeNode::Build(leaf) => NodeIdentity::Build(leaf.build.id.clone()),
        }
    }

    pub fn as_build(&self) -> Option<&BuildNode> {
        match self {
            TreeNode::Build(leaf) => Some(leaf),
            TreeNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            TreeNode::Group(group) => Some(group),
            TreeNode::Build(_) => None,
        }
    }

    /// Most severe status of all builds below (or at) this node.
    pub fn aggregate_status(&self) -> BuildStatus {
        match self {
            TreeNode::Build(leaf) => leaf.status,
            TreeNode::Group(group) => group
                .children
                .iter()
                .map(TreeNode::aggregate_status)
                .max()
                .unwrap_or_default(),
        }
    }

    /// Latest change time of all builds below (or at) this node.
    pub fn last_changed(&self) -> Option<DateTime<Utc>> {
        match self {
            TreeNode::Build(leaf) => leaf.last_changed_time,
            TreeNode::Group(group) => group
                .children
                .iter()
                .filter_map(TreeNode::last_changed)
                .max(),
        }
    }

    /// Number of build leaves below (or at) this node.
    pub fn build_count(&self) -> usize {
        match self {
            TreeNode::Build(_) => 1,
            TreeNode::Group(group) => group.children.iter().map(TreeNode::build_count).sum(),
        }
    }

    /// Refreshes mutable values from a node with the same identity.
    ///
    /// Leaves copy their status snapshot, groups pick up a changed label.
    /// Nodes of a different identity are ignored.
    pub fn update_with_values_from(&mut self, other: &TreeNode) {
        if *self != *other {
            return;
        }

        match (self, other) {
            (TreeNode::Build(mine), TreeNode::Build(theirs)) => {
                mine.update_with_values_from(theirs);
            }
            (TreeNode::Group(mine), TreeNode::Group(theirs)) => {
                mine.label.clone_from(&theirs.label);
            }
            _ => {}
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TreeNode::Group(a), TreeNode::Group(b)) => a.kind == b.kind && a.key == b.key,
            (TreeNode::Build(a), TreeNode::Build(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TreeNode {}

/// Root of an arranged build tree (depth 0).
#[derive(Debug, Clone, Default)]
pub struct BuildTree {
    grouping: GroupingSpec,
    pub(crate) children: Vec<TreeNode>,
}

impl BuildTree {
    pub(crate) fn new(grouping: GroupingSpec, children: Vec<TreeNode>) -> Self {
        Self { grouping, children }
    }

    pub fn grouping(&self) -> &GroupingSpec {
        &self.grouping
    }

    pub(crate) fn set_grouping(&mut self, grouping: GroupingSpec) {
        self.grouping = grouping;
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All nodes below the root in pre-order.
    pub fn all_nodes(&self) -> Nodes<'_> {
        Nodes::new(&self.children)
    }

    /// All build leaves in traversal order.
    pub fn leaves(&self) -> impl Iterator<Item = &BuildNode> {
        self.all_nodes().filter_map(TreeNode::as_build)
    }

    pub fn nodes_at_depth(&self, depth: usize) -> impl Iterator<Item = &TreeNode> {
        self.all_nodes().filter(move |node| node.depth() == depth)
    }

    pub fn build_count(&self) -> usize {
        self.children.iter().map(TreeNode::build_count).sum()
    }

    /// Copy of the tree keeping only builds accepted by `keep`.
    ///
    /// Groups left without any build are dropped, so leaf depth is unchanged.
    pub fn retain_builds<F>(&self, keep: F) -> BuildTree
    where
        F: Fn(&Build) -> bool,
    {
        BuildTree {
            grouping: self.grouping.clone(),
            children: retain_nodes(&self.children, &keep),
        }
    }
}

fn retain_nodes<F>(nodes: &[TreeNode], keep: &F) -> Vec<TreeNode>
where
    F: Fn(&Build) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| match node {
            TreeNode::Build(leaf) => keep(&leaf.build).then(|| node.clone()),
            TreeNode::Group(group) => {
                let children = retain_nodes(&group.children, keep);
                (!children.is_empty()).then(|| {
                    let mut pruned = group.clone_without_children();
                    pruned.children = children;
                    TreeNode::Group(pruned)
                })
            }
        })
        .collect()
}

impl GroupNode {
    fn clone_without_children(&self) -> GroupNode {
        GroupNode::new(self.kind, self.key.clone(), self.label.clone(), self.depth)
    }
}

/// Pre-order iterator over tree nodes.
pub struct Nodes<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Nodes<'a> {
    fn new(roots: &'a [TreeNode]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
