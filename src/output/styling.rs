use console::{style, StyledObject};

use crate::build::BuildStatus;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Status name colored by how bad it is.
pub fn status(status: BuildStatus) -> StyledObject<String> {
    match status {
        BuildStatus::Succeeded => bright_green(status),
        BuildStatus::PartiallySucceeded | BuildStatus::Running | BuildStatus::Pending => {
            bright_yellow(status)
        }
        BuildStatus::Failed => bright_red(status),
        BuildStatus::Cancelled | BuildStatus::None => dim(status),
    }
}
