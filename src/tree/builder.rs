use indexmap::IndexMap;
use log::debug;

use crate::build::Build;

use super::grouping::{GroupDefinition, GroupingSpec};
use super::node::{BuildNode, BuildTree, GroupKind, GroupNode, TreeNode};

/// Maps a build to the key of its source group.
pub type KeyExtractor = Box<dyn Fn(&Build) -> String>;

/// Arranges a flat collection of builds into a [`BuildTree`].
///
/// The builder is stateless: every call to [`TreeBuilder::build`] produces a new tree
/// that depends only on the given builds and the grouping.
pub struct TreeBuilder {
    grouping: GroupingSpec,
    source_key: KeyExtractor,
}

impl TreeBuilder {
    pub fn new(grouping: GroupingSpec) -> Self {
        Self {
            grouping,
            source_key: Box::new(|build| build.source.id.clone()),
        }
    }

    /// Replaces the key used to group builds by source (defaults to `source.id`).
    #[must_use]
    pub fn with_source_key<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Build) -> String + 'static,
    {
        self.source_key = Box::new(extractor);
        self
    }

    pub fn grouping(&self) -> &GroupingSpec {
        &self.grouping
    }

    /// Builds a new tree snapshot.
    ///
    /// Groups appear in the order their key is first seen in `builds`, leaves keep
    /// the input order. An empty input yields an empty tree for every grouping.
    pub fn build<'a, I>(&self, builds: I) -> BuildTree
    where
        I: IntoIterator<Item = &'a Build>,
    {
        let builds: Vec<&Build> = builds.into_iter().collect();
        debug!(
            "Arranging {} builds by [{}]",
            builds.len(),
            self.grouping
        );

        let children = self.arrange(builds, 0, 1);
        BuildTree::new(self.grouping.clone(), children)
    }

    fn arrange(&self, builds: Vec<&Build>, position: usize, depth: usize) -> Vec<TreeNode> {
        if builds.is_empty() {
            return Vec::new();
        }

        let Some(definition) = self.grouping.definitions().get(position) else {
            return builds
                .into_iter()
                .map(|build| TreeNode::Build(BuildNode::new(build.clone(), depth)))
                .collect();
        };

        let kind = match definition {
            GroupDefinition::None => return self.arrange(builds, position + 1, depth),
            GroupDefinition::Source => GroupKind::Source,
            GroupDefinition::Branch => GroupKind::Branch,
            GroupDefinition::BuildDefinition => GroupKind::Definition,
            GroupDefinition::Status => GroupKind::Status,
        };

        let mut partitions: IndexMap<String, (String, Vec<&Build>)> = IndexMap::new();
        for build in builds {
            let (key, label) = self.group_key(kind, build);
            partitions
                .entry(key)
                .or_insert_with(|| (label, Vec::new()))
                .1
                .push(build);
        }

        partitions
            .into_iter()
            .map(|(key, (label, members))| {
                let mut group = GroupNode::new(kind, key, label, depth);
                group.children = self.arrange(members, position + 1, depth + 1);
                TreeNode::Group(group)
            })
            .collect()
    }

    fn group_key(&self, kind: GroupKind, build: &Build) -> (String, String) {
        match kind {
            GroupKind::Source => ((self.source_key)(build), build.source.name.clone()),
            GroupKind::Branch => (
                build.branch_full_name.clone(),
                build.branch_name().to_string(),
            ),
            GroupKind::Definition => (build.definition.id.clone(), build.definition.name.clone()),
            GroupKind::Status => (
                build.status.as_str().to_string(),
                build.status.as_str().to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::test_support::*;
    use crate::build::BuildStatus;
    use crate::tree::node::NodeIdentity;

    fn builder(definitions: &[GroupDefinition]) -> TreeBuilder {
        TreeBuilder::new(GroupingSpec::new(definitions.iter().copied()))
    }

    #[test]
    fn empty_grouping_and_no_builds_gives_empty_tree() {
        let tree = builder(&[]).build(&[]);
        assert!(tree.is_empty());
    }

    #[test]
    fn no_builds_gives_empty_tree_for_any_grouping() {
        let groupings = [
            vec![
                GroupDefinition::Branch,
                GroupDefinition::BuildDefinition,
                GroupDefinition::Status,
            ],
            vec![
                GroupDefinition::BuildDefinition,
                GroupDefinition::Branch,
                GroupDefinition::Status,
            ],
            vec![GroupDefinition::None],
        ];

        for grouping in groupings {
            let tree = builder(&grouping).build(&[]);
            assert!(tree.children().is_empty(), "grouping {grouping:?}");
        }
    }

    #[test]
    fn empty_grouping_gives_flat_list_of_leaves() {
        let builds = vec![
            build("1", "CI", "main"),
            build("2", "CI", "develop"),
            build("3", "Nightly", "main"),
        ];

        let tree = builder(&[]).build(&builds);

        assert_eq!(tree.children().len(), builds.len());
        let ids: Vec<&str> = tree.leaves().map(|l| l.build().id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(tree.leaves().all(|l| l.depth() == 1));
    }

    #[test]
    fn one_grouping_level_with_single_build() {
        for grouping in [
            GroupDefinition::Branch,
            GroupDefinition::BuildDefinition,
            GroupDefinition::None,
        ] {
            let tree = builder(&[grouping, GroupDefinition::Status]).build(&[build("1", "CI", "branch")]);
            assert_eq!(tree.children().len(), 1, "grouping {grouping:?}");
        }
    }

    #[test]
    fn tree_matches_grouping_levels() {
        let tree = builder(&[
            GroupDefinition::Source,
            GroupDefinition::Branch,
            GroupDefinition::BuildDefinition,
        ])
        .build(&[build("1", "Nightly", "stage")]);

        let kinds = |depth: usize| -> Vec<Option<GroupKind>> {
            tree.nodes_at_depth(depth)
                .map(|n| n.as_group().map(GroupNode::kind))
                .collect()
        };

        assert_eq!(kinds(1), vec![Some(GroupKind::Source)]);
        assert_eq!(kinds(2), vec![Some(GroupKind::Branch)]);
        assert_eq!(kinds(3), vec![Some(GroupKind::Definition)]);
        assert_eq!(tree.nodes_at_depth(4).count(), 1);
        assert!(tree.nodes_at_depth(4).all(|n| n.as_build().is_some()));
    }

    #[test]
    fn none_levels_do_not_add_depth() {
        let tree = builder(&[
            GroupDefinition::None,
            GroupDefinition::Branch,
            GroupDefinition::None,
        ])
        .build(&[build("1", "CI", "main"), build("2", "CI", "dev")]);

        assert_eq!(tree.children().len(), 2);
        assert!(tree.leaves().all(|l| l.depth() == 2));
        assert_eq!(tree.grouping().depth(), 1);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let tree = builder(&[GroupDefinition::Branch]).build(&[
            build("1", "CI", "zeta"),
            build("2", "CI", "alpha"),
            build("3", "CI", "zeta"),
        ]);

        let keys: Vec<&str> = tree
            .children()
            .iter()
            .filter_map(|n| n.as_group().map(GroupNode::key))
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        let zeta_ids: Vec<&str> = tree.children()[0]
            .children()
            .iter()
            .filter_map(|n| n.as_build().map(|l| l.build().id.as_str()))
            .collect();
        assert_eq!(zeta_ids, vec!["1", "3"]);
    }

    #[test]
    fn shared_key_collapses_into_single_group() {
        let tree = builder(&[GroupDefinition::BuildDefinition]).build(&[
            build("1", "CI", "main"),
            build("2", "CI", "dev"),
        ]);

        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.children()[0].children().len(), 2);
    }

    #[test]
    fn repeated_dimension_adds_redundant_level() {
        let tree = builder(&[GroupDefinition::Branch, GroupDefinition::Branch])
            .build(&[build("1", "CI", "main")]);

        assert_eq!(tree.nodes_at_depth(1).count(), 1);
        assert_eq!(tree.nodes_at_depth(2).count(), 1);
        assert_eq!(tree.leaves().next().unwrap().depth(), 3);
    }

    #[test]
    fn building_twice_yields_equal_leaves() {
        let builds = vec![
            build("1", "CI", "main"),
            build("2", "Nightly", "main"),
            build("3", "CI", "dev"),
        ];
        let sut = builder(&[GroupDefinition::Branch, GroupDefinition::BuildDefinition]);

        let first = sut.build(&builds);
        let second = sut.build(&builds);

        let first_leaves: Vec<&BuildNode> = first.leaves().collect();
        let second_leaves: Vec<&BuildNode> = second.leaves().collect();
        assert_eq!(first_leaves, second_leaves);
    }

    #[test]
    fn status_level_groups_by_status() {
        let tree = builder(&[GroupDefinition::Status]).build(&[
            with_status(build("1", "CI", "main"), BuildStatus::Failed),
            with_status(build("2", "CI", "main"), BuildStatus::Succeeded),
            with_status(build("3", "CI", "main"), BuildStatus::Failed),
        ]);

        let identities: Vec<NodeIdentity> = tree.children().iter().map(TreeNode::identity).collect();
        assert_eq!(
            identities,
            vec![
                NodeIdentity::Group(GroupKind::Status, "Failed".to_string()),
                NodeIdentity::Group(GroupKind::Status, "Succeeded".to_string()),
            ]
        );
    }

    #[test]
    fn labels_use_display_names() {
        let tree = builder(&[GroupDefinition::Branch, GroupDefinition::BuildDefinition])
            .build(&[build("1", "Nightly", "refs/heads/feature/x")]);

        let branch = tree.children()[0].as_group().unwrap();
        assert_eq!(branch.key(), "refs/heads/feature/x");
        assert_eq!(branch.label(), "feature/x");

        let definition = tree.children()[0].children()[0].as_group().unwrap();
        assert_eq!(definition.key(), "nightly");
        assert_eq!(definition.label(), "Nightly");
    }

    #[test]
    fn source_key_is_injectable() {
        let builds = vec![
            with_source(build("1", "CI", "main"), "azure-eu", "Azure"),
            with_source(build("2", "CI", "main"), "azure-us", "Azure"),
        ];

        let by_id = builder(&[GroupDefinition::Source]).build(&builds);
        assert_eq!(by_id.children().len(), 2);

        let by_name = builder(&[GroupDefinition::Source])
            .with_source_key(|b| b.source.name.clone())
            .build(&builds);
        assert_eq!(by_name.children().len(), 1);
    }
}
