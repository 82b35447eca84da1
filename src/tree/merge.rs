use log::debug;

use super::node::{BuildTree, TreeNode};

/// Counts of what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub retained: usize,
    pub inserted: usize,
    pub removed: usize,
}

impl BuildTree {
    /// Folds a freshly built tree into this one.
    ///
    /// Nodes equal by identity are kept and refreshed through
    /// [`TreeNode::update_with_values_from`], new nodes are inserted and nodes missing
    /// from `fresh` are dropped. Siblings end up in the order of `fresh`.
    pub fn merge(&mut self, fresh: BuildTree) -> MergeSummary {
        let mut summary = MergeSummary::default();
        self.set_grouping(fresh.grouping().clone());
        let current = std::mem::take(&mut self.children);
        self.children = merge_children(current, fresh.children, &mut summary);

        debug!(
            "Merged tree: {} retained, {} inserted, {} removed",
            summary.retained, summary.inserted, summary.removed
        );

        summary
    }
}

fn merge_children(
    mut current: Vec<TreeNode>,
    fresh: Vec<TreeNode>,
    summary: &mut MergeSummary,
) -> Vec<TreeNode> {
    let mut merged = Vec::with_capacity(fresh.len());

    for incoming in fresh {
        let Some(position) = current.iter().position(|node| *node == incoming) else {
            summary.inserted += incoming_size(&incoming);
            merged.push(incoming);
            continue;
        };

        let mut retained = current.swap_remove(position);
        retained.update_with_values_from(&incoming);
        summary.retained += 1;

        if let (TreeNode::Group(mine), TreeNode::Group(theirs)) = (&mut retained, incoming) {
            let children = std::mem::take(&mut mine.children);
            mine.children = merge_children(children, theirs.children, summary);
        }

        merged.push(retained);
    }

    summary.removed += current.iter().map(incoming_size).sum::<usize>();
    merged
}

fn incoming_size(node: &TreeNode) -> usize {
    1 + node.children().iter().map(incoming_size).sum::<usize>()
}
