//! Study-notes domain logic.
//!
//! - [`request`]: Inbound request parsing and validation
//! - [`prompt`]: Fixed prompt template and message assembly

pub mod prompt;
pub mod request;
