use std::fmt::Write;

use comfy_table::Cell;

use crate::report::{
    BuildSummary, DeltaReport, NodeReport, SearchReport, SuggestionReport, TreeReport,
};

use super::styling::{bright, bright_yellow, cyan, dim, status};
use super::tables::{builds_table, create_cyan_header, create_table};

/// Prints a build tree as an indented outline to stdout.
///
/// Groups show their aggregate status (the worst status below them) and build
/// count; leaves show the build id, definition and status.
pub fn print_tree(report: &TreeReport) {
    println!("{}", render_tree(report));
}

/// Prints the builds that reached a terminal status, one table per outcome.
pub fn print_delta(report: &DeltaReport) {
    println!("{}", render_delta(report));
}

/// Prints the parsed blocks of a search followed by the matching builds.
pub fn print_search(report: &SearchReport) {
    println!("{}", render_search(report));
}

pub fn print_suggestions(suggestions: &[SuggestionReport]) {
    println!("{}", render_suggestions(suggestions));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_tree(report: &TreeReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🌳", "Build Tree");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n",
        dim("Grouping:"),
        cyan(if report.grouping.is_empty() {
            "(flat)"
        } else {
            report.grouping.as_str()
        }),
        dim("Builds:"),
        bright_yellow(report.total_builds),
    );

    if report.nodes.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No builds found."));
        return output;
    }

    for node in &report.nodes {
        render_node(&mut output, node, 1);
    }

    output
}

fn render_node(output: &mut String, node: &NodeReport, level: usize) {
    let indent = "  ".repeat(level);

    match node {
        NodeReport::Group {
            kind,
            label,
            status: aggregate,
            build_count,
            children,
            ..
        } => {
            let _ = writeln!(
                output,
                "{indent}{} {} {} {}",
                dim(format!("{kind:?}").to_lowercase()),
                bright(label),
                status(*aggregate),
                dim(format!("({build_count})")),
            );
            for child in children {
                render_node(output, child, level + 1);
            }
        }
        NodeReport::Build(build) => {
            let _ = writeln!(
                output,
                "{indent}{} {} {}",
                cyan(format!("#{}", build.id)),
                build.definition,
                status(build.status),
            );
        }
    }
}

fn render_delta(report: &DeltaReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🔔", "Status Changes");
    let _ = writeln!(
        output,
        "  {} {}\n",
        dim("Partially succeeded:"),
        report.partial_succeeded_treatment
    );

    if report.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No builds changed status."));
        return output;
    }

    let sections: [(&str, &str, &[BuildSummary]); 3] = [
        ("✅", "Succeeded", report.succeeded.as_slice()),
        ("❌", "Failed", report.failed.as_slice()),
        ("⛔", "Cancelled", report.cancelled.as_slice()),
    ];

    for (emoji, title, builds) in sections {
        if builds.is_empty() {
            continue;
        }
        add_section_header(&mut output, emoji, title);
        let _ = writeln!(output, "{}\n", builds_table(builds));
    }

    output
}

fn render_search(report: &SearchReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🔎", "Search");

    let mut blocks = create_table();
    blocks.set_header(create_cyan_header(&["#", "Keyword", "Entered", "Term"]));
    for (idx, block) in report.blocks.iter().enumerate() {
        let keyword = if block.keyword.is_empty() {
            Cell::new("(any)")
        } else {
            Cell::new(&block.keyword)
        };
        blocks.add_row(vec![
            Cell::new(idx + 1),
            keyword,
            Cell::new(format!("{:?}", block.entered_text)),
            Cell::new(&block.search_term),
        ]);
    }
    let _ = writeln!(output, "{blocks}\n");

    let _ = writeln!(
        output,
        "  {} {} / {}\n",
        dim("Matched:"),
        bright_yellow(report.matched.len()),
        report.total_builds
    );

    if !report.matched.is_empty() {
        let _ = writeln!(output, "{}", builds_table(&report.matched));
    }

    output
}

fn render_suggestions(suggestions: &[SuggestionReport]) -> String {
    if suggestions.is_empty() {
        return dim("No suggestions.").to_string();
    }

    suggestions
        .iter()
        .map(|suggestion| {
            if suggestion.is_keyword {
                format!("{}{}", cyan(&suggestion.text), dim(":"))
            } else {
                suggestion.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
