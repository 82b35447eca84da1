//! Arranges CI builds into a tree, reports builds that reached a terminal status
//! between two refreshes and filters builds with free-text searches such as
//! `branch: main, after: yesterday`.

pub mod build;
pub mod clock;
pub mod config;
pub mod error;
pub mod locale;
pub mod output;
pub mod report;
pub mod search;
pub mod snapshot;
pub mod tree;
