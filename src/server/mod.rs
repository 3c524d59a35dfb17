//! HTTP server for the notes API.
//!
//! - [`notes_api`]: Router, state and route handlers
//! - [`streaming`]: SSE relay of generated text

pub mod notes_api;
pub mod streaming;
