//! # quill-transcript
//!
//! The conversation engine behind a Quill document: splitting the text into
//! turns, spotting a freshly completed user turn, bounding the context sent
//! upstream, and writing the reply back so it is never mistaken for input.

pub mod assemble;
pub mod detect;
pub mod format;
pub mod parse;
pub mod session;
pub mod writer;

pub use session::{Session, TickOutcome};
