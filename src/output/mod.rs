mod styling;
mod summary;
mod tables;

pub use styling::{dim, magenta_bold};
pub use summary::{print_delta, print_search, print_suggestions, print_tree};

/// Prints the `BuildLens` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🌳 BuildLens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Build tree, status change and search tool")
    );
}
