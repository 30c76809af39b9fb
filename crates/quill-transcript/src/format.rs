//! Document layout conventions: separators, the send terminator, and the
//! colour markers of the marker format.

use quill_core::config::DocumentFormat;

/// Boundary between consecutive turns in the plain format.
pub const SEPARATOR: &str = "\n***\n";

/// Two trailing newlines: the "send" gesture (Enter pressed twice).
pub const TERMINATOR: &str = "\n\n";

/// Style fragment carried by user lines in the marker format.
pub const USER_MARKER: &str = "color: blue";

/// Style fragment carried by assistant lines in the marker format.
pub const ASSISTANT_MARKER: &str = "color: orange";

/// Line break inside a marker-format turn.
pub const LINE_BREAK: &str = "<br>";

/// Markdown rule substituted for `***` lines that appear inside a reply.
const NEUTRAL_RULE: &str = "* * *";

/// Wrap one line of content in a colour marker.
pub fn wrap_line(marker: &str, line: &str) -> String {
    format!("<span style=\"{marker}\">{line}</span>")
}

/// Strip a `<span ...>` … `</span>` wrapper, if present.
///
/// The line is returned trimmed; unwrapped lines pass through untouched.
pub fn strip_marker(line: &str) -> &str {
    let trimmed = line.trim();
    if !trimmed.contains("<span") {
        return trimmed;
    }
    let start = trimmed.find('>').map(|i| i + 1);
    let end = trimmed.rfind('<');
    match (start, end) {
        (Some(start), Some(end)) if end > start => trimmed[start..end].trim(),
        (Some(start), Some(end)) if end == start => "",
        _ => trimmed,
    }
}

/// Whether a non-empty line counts as turn content in the marker format.
///
/// Headings (`#` lines) are document furniture, not turns.
pub fn is_content_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// The block appended after an assistant reply.
///
/// Plain: the reply sits between two separators, so the user turn it answers
/// and the user turn that follows each end up in their own piece. A block
/// opening with a bare newline instead would leave the reply in the same
/// piece as the user turn and shift every role after it.
/// Marker: the whole reply on one assistant-marked line.
pub fn reply_block(format: DocumentFormat, text: &str) -> String {
    let text = text.trim();
    match format {
        DocumentFormat::Plain => format!("{SEPARATOR}{}{SEPARATOR}", neutralize_separators(text)),
        DocumentFormat::Marker => format!("\n{}\n", wrap_turn(ASSISTANT_MARKER, text)),
    }
}

/// The block appended for a user turn (without the final send newline).
pub fn user_block(format: DocumentFormat, text: &str) -> String {
    let text = text.trim();
    match format {
        DocumentFormat::Plain => format!("\n{text}\n"),
        DocumentFormat::Marker => format!("\n{}\n", wrap_turn(USER_MARKER, text)),
    }
}

/// Text of one marker-format line, with line breaks restored.
pub fn marker_content(line: &str) -> String {
    strip_marker(line)
        .replace(LINE_BREAK, "\n")
        .trim()
        .to_string()
}

/// One marked line per turn: a line is a turn in the marker format, so
/// newlines inside the text become [`LINE_BREAK`].
fn wrap_turn(marker: &str, text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(LINE_BREAK);
    wrap_line(marker, &joined)
}

/// Rewrite `***` rule lines inside `text` so the parser never splits it.
fn neutralize_separators(text: &str) -> String {
    text.lines()
        .map(|line| if line.trim() == "***" { NEUTRAL_RULE } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}
