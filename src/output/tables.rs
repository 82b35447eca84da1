use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::build::BuildStatus;
use crate::report::BuildSummary;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_status_cell(status: BuildStatus) -> Cell {
    let cell = Cell::new(status);
    match status {
        BuildStatus::Succeeded => cell.fg(TableColor::Green),
        BuildStatus::PartiallySucceeded | BuildStatus::Running | BuildStatus::Pending => {
            cell.fg(TableColor::Yellow)
        }
        BuildStatus::Failed => cell.fg(TableColor::Red),
        BuildStatus::Cancelled | BuildStatus::None => cell.fg(TableColor::DarkGrey),
    }
}

/// One row per build: id, definition, branch, source, status, queued.
pub fn builds_table(builds: &[BuildSummary]) -> Table {
    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Build", "Definition", "Branch", "Source", "Status", "Queued",
    ]));

    for build in builds {
        let queued = build
            .queue_time
            .map_or_else(|| "N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        table.add_row(vec![
            Cell::new(&build.id),
            Cell::new(&build.definition),
            Cell::new(&build.branch),
            Cell::new(&build.source),
            color_coded_status_cell(build.status),
            Cell::new(queued),
        ]);
    }

    table
}
