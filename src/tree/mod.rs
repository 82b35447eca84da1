mod builder;
mod delta;
mod grouping;
mod merge;
mod node;

pub use builder::{KeyExtractor, TreeBuilder};
pub use delta::{BuildsDelta, PartialSucceededTreatmentMode, StatusSnapshot};
pub use grouping::{GroupDefinition, GroupingSpec};
pub use merge::MergeSummary;
pub use node::{BuildNode, BuildTree, GroupKind, GroupNode, NodeIdentity, Nodes, TreeNode};
