//! # quill-providers
//!
//! Completion service clients for Quill.

pub mod deepseek;
pub mod openai;
