//! Turn parser: raw document text to role-tagged turns.
//!
//! Roles come from position alone: the first non-empty piece is the user,
//! the next the assistant, and so on. A turn deleted or reordered by hand
//! shifts every role after it.

use quill_core::{
    config::DocumentFormat,
    message::{Role, Turn},
};

use crate::format::{is_content_line, marker_content, SEPARATOR};

/// Split `text` into ordered turns. Total over any input.
pub fn parse(format: DocumentFormat, text: &str) -> Vec<Turn> {
    match format {
        DocumentFormat::Plain => assign_roles(text.split(SEPARATOR)),
        DocumentFormat::Marker => {
            let lines: Vec<String> = text
                .lines()
                .filter(|line| is_content_line(line))
                .map(marker_content)
                .collect();
            assign_roles(lines.iter().map(String::as_str))
        }
    }
}

fn assign_roles<'a>(pieces: impl Iterator<Item = &'a str>) -> Vec<Turn> {
    pieces
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .filter_map(|(i, piece)| Turn::new(Role::at_position(i), piece))
        .collect()
}
