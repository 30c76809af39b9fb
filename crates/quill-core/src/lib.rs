//! # quill-core
//!
//! Core types, traits, configuration, and error handling for Quill.

pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod traits;
