//! notes-stream: study-notes generation over server-sent events.
//!
//! Accepts a topic and subject, sends a templated prompt to an
//! OpenAI-compatible chat completion API and relays the generated text to the
//! caller as it arrives.

pub mod config;
pub mod notes;
pub mod server;
pub mod upstream;
