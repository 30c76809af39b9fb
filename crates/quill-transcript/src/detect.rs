//! Boundary detector: decides whether the document now ends with a freshly
//! completed user turn.
//!
//! Detection is stateless apart from the previous snapshot. The turn is always
//! re-derived from the last separator (or the last content line in the marker
//! format), never from a stored cursor, so a restart costs at most one re-read.

use quill_core::config::DocumentFormat;

use crate::format::{is_content_line, marker_content, ASSISTANT_MARKER, SEPARATOR, TERMINATOR};

/// Outcome of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The document is byte-identical to the previous snapshot.
    NoChange,
    /// Changed, but no completed user turn yet. The snapshot should advance.
    WaitingForTerminator,
    /// The newest content is already a reply. The snapshot should advance.
    ReplyIsLast,
    /// A completed user turn is ready to send.
    NewUserTurn(PendingTurn),
}

/// A completed user turn and the document text in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Trimmed, non-empty turn text.
    pub text: String,
    /// Everything before the turn, fed to the parser for context.
    pub preceding: String,
}

/// Compare `previous` against `current`.
pub fn detect(format: DocumentFormat, previous: &str, current: &str) -> Detection {
    if current == previous {
        return Detection::NoChange;
    }
    if !current.ends_with(TERMINATOR) {
        return Detection::WaitingForTerminator;
    }
    match format {
        DocumentFormat::Plain => detect_plain(current),
        DocumentFormat::Marker => detect_marker(current),
    }
}

fn detect_plain(current: &str) -> Detection {
    let body_end = current.len() - TERMINATOR.len();
    // Include the first terminator newline so a separator sitting right
    // before the terminator ("...\n***\n\n") is still found.
    let searchable = &current[..current.len() - 1];

    let (start, preceding) = match searchable.rfind(SEPARATOR) {
        Some(idx) => (idx + SEPARATOR.len(), &current[..idx]),
        None => (0, ""),
    };
    let candidate = if start >= body_end {
        ""
    } else {
        current[start..body_end].trim()
    };

    if candidate.is_empty() {
        return Detection::WaitingForTerminator;
    }
    Detection::NewUserTurn(PendingTurn {
        text: candidate.to_string(),
        preceding: preceding.to_string(),
    })
}

fn detect_marker(current: &str) -> Detection {
    let body = &current[..current.len() - TERMINATOR.len()];

    let mut offset = 0;
    let mut last: Option<(usize, &str)> = None;
    for line in body.split('\n') {
        if is_content_line(line) {
            last = Some((offset, line));
        }
        offset += line.len() + 1;
    }

    let Some((line_start, line)) = last else {
        return Detection::WaitingForTerminator;
    };
    let candidate = marker_content(line);
    if candidate.is_empty() {
        return Detection::WaitingForTerminator;
    }
    if line.contains(ASSISTANT_MARKER) {
        return Detection::ReplyIsLast;
    }
    Detection::NewUserTurn(PendingTurn {
        text: candidate,
        preceding: body[..line_start].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::format::{reply_block, user_block};
    use quill_core::message::Role;

    fn pending(text: &str, preceding: &str) -> Detection {
        Detection::NewUserTurn(PendingTurn {
            text: text.into(),
            preceding: preceding.into(),
        })
    }

    #[test]
    fn test_unchanged_document_is_no_change() {
        for doc in ["", "Hi\n\n", "Q1\n***\nA1\n***\n", "typing"] {
            assert_eq!(detect(DocumentFormat::Plain, doc, doc), Detection::NoChange);
            assert_eq!(
                detect(DocumentFormat::Marker, doc, doc),
                Detection::NoChange
            );
        }
    }

    #[test]
    fn test_without_terminator_waits() {
        for (prev, doc) in [
            ("", "Hello"),
            ("", "Hello\n"),
            ("Hello\n\n", "Hello\n\nmore"),
            ("anything", "\n"),
            ("x", ""),
            ("", "Q1\n\n\n***\nA1\n***\n"),
        ] {
            assert_eq!(
                detect(DocumentFormat::Plain, prev, doc),
                Detection::WaitingForTerminator,
                "doc {doc:?}"
            );
        }
    }

    #[test]
    fn test_first_turn_in_empty_document() {
        assert_eq!(
            detect(DocumentFormat::Plain, "", "Hello\n\n"),
            pending("Hello", "")
        );
    }

    #[test]
    fn test_repeated_snapshot_is_no_change() {
        assert_eq!(
            detect(DocumentFormat::Plain, "Hi\n\n", "Hi\n\n"),
            Detection::NoChange
        );
    }

    #[test]
    fn test_turn_after_last_separator() {
        assert_eq!(
            detect(DocumentFormat::Plain, "", "Q1\n***\nA1\n***\nQ2\n\n"),
            pending("Q2", "Q1\n***\nA1")
        );
    }

    #[test]
    fn test_blank_lines_inside_turn_are_kept() {
        assert_eq!(
            detect(DocumentFormat::Plain, "", "Q1\n***\nA1\n***\npara one\n\npara two\n\n"),
            pending("para one\n\npara two", "Q1\n***\nA1")
        );
    }

    #[test]
    fn test_terminator_right_after_separator_is_not_a_message() {
        assert_eq!(
            detect(DocumentFormat::Plain, "", "Q1\n***\nA1\n***\n\n"),
            Detection::WaitingForTerminator
        );
    }

    #[test]
    fn test_whitespace_only_candidate_waits() {
        assert_eq!(
            detect(DocumentFormat::Plain, "", "Q1\n***\nA1\n***\n   \n\n"),
            Detection::WaitingForTerminator
        );
        assert_eq!(
            detect(DocumentFormat::Plain, "", "\n\n"),
            Detection::WaitingForTerminator
        );
    }

    #[test]
    fn test_marker_last_user_line() {
        let doc = "# Chat\n<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>\n<span style=\"color: blue\">How are you?</span>\n\n";
        assert_eq!(
            detect(DocumentFormat::Marker, "", doc),
            pending(
                "How are you?",
                "# Chat\n<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>\n"
            )
        );
    }

    #[test]
    fn test_marker_unwrapped_user_line() {
        let doc = "<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>\nplain question\n\n";
        match detect(DocumentFormat::Marker, "", doc) {
            Detection::NewUserTurn(p) => assert_eq!(p.text, "plain question"),
            other => panic!("expected a new turn, got {other:?}"),
        }
    }

    #[test]
    fn test_marker_skips_when_reply_is_last() {
        let doc = "<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>\n\n";
        assert_eq!(
            detect(DocumentFormat::Marker, "", doc),
            Detection::ReplyIsLast
        );
    }

    #[test]
    fn test_marker_trailing_heading_is_ignored() {
        let doc = "<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>\n# Notes\n\n";
        assert_eq!(
            detect(DocumentFormat::Marker, "", doc),
            Detection::ReplyIsLast
        );
    }

    #[test]
    fn test_marker_only_headings_waits() {
        assert_eq!(
            detect(DocumentFormat::Marker, "", "# Chat\n\n"),
            Detection::WaitingForTerminator
        );
    }

    #[test]
    fn test_marker_multiline_user_turn() {
        let doc = format!(
            "<span style=\"color: blue\">Hi</span>\n<span style=\"color: orange\">Hello!</span>{}\n",
            user_block(DocumentFormat::Marker, "first line\n\nsecond line")
        );
        match detect(DocumentFormat::Marker, "", &doc) {
            Detection::NewUserTurn(p) => assert_eq!(p.text, "first line\n\nsecond line"),
            other => panic!("expected a new turn, got {other:?}"),
        }
    }

    #[test]
    fn test_marker_multiline_reply_is_last() {
        let mut doc = "<span style=\"color: blue\">Hi</span>\n\n".to_string();
        doc.push_str(&reply_block(DocumentFormat::Marker, "L1\nL2"));
        doc.push('\n');
        assert_eq!(
            detect(DocumentFormat::Marker, "", &doc),
            Detection::ReplyIsLast
        );
    }

    #[test]
    fn test_marker_multiline_reply_stays_assistant_in_context() {
        let mut doc = "<span style=\"color: blue\">Hi</span>\n\n".to_string();
        doc.push_str(&reply_block(DocumentFormat::Marker, "L1\nL2"));
        doc.push_str(&user_block(DocumentFormat::Marker, "Next"));
        doc.push('\n');

        let Detection::NewUserTurn(pending) = detect(DocumentFormat::Marker, "", &doc) else {
            panic!("expected a new turn");
        };
        let turns = assemble(DocumentFormat::Marker, &pending.preceding, &pending.text);
        let pairs: Vec<(Role, &str)> = turns.iter().map(|t| (t.role(), t.content())).collect();
        assert_eq!(
            pairs,
            vec![
                (Role::User, "Hi"),
                (Role::Assistant, "L1\nL2"),
                (Role::User, "Next")
            ]
        );
    }
}
