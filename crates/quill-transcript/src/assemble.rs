//! Context assembler: bounds the turns sent upstream for one request.

use quill_core::{
    config::DocumentFormat,
    message::{Role, Turn},
};

use crate::parse::parse;

/// Upper bound on turns in one request, including the new user turn.
pub const MAX_CONTEXT_TURNS: usize = 6;

/// Prior turns kept ahead of the new user turn.
pub const MAX_PRIOR_TURNS: usize = MAX_CONTEXT_TURNS - 1;

/// Keep only the newest `limit` turns.
///
/// Whole turns are dropped from the oldest end; the window may start on an
/// assistant turn afterwards.
pub fn trim_window(mut turns: Vec<Turn>, limit: usize) -> Vec<Turn> {
    if turns.len() > limit {
        turns.drain(..turns.len() - limit);
    }
    turns
}

/// Build the request window: the last [`MAX_PRIOR_TURNS`] turns of
/// `preceding`, then `new_text` as a user turn.
///
/// Always returns between 1 and [`MAX_CONTEXT_TURNS`] turns when `new_text`
/// is non-blank, ending with the new user turn.
pub fn assemble(format: DocumentFormat, preceding: &str, new_text: &str) -> Vec<Turn> {
    let mut turns = trim_window(parse(format, preceding), MAX_PRIOR_TURNS);
    turns.extend(Turn::new(Role::User, new_text));
    turns
}
