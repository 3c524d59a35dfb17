//! Upstream chat-completion API.
//!
//! - [`client`]: Request types and the [`client::CompletionClient`] seam
//! - [`openai`]: OpenAI-compatible streaming client over reqwest

pub mod client;
pub mod openai;
