//! OpenAI-compatible streaming chat client.
//!
//! Posts to `{base_url}/chat/completions` with `stream: true` and decodes the
//! SSE response with `eventsource-stream`. Each chunk's
//! `choices[0].delta.content` becomes one delta; `data: [DONE]` ends the stream.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::stream::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::upstream::client::{
    ChatCompletionRequest, CompletionClient, DeltaStream, UpstreamError,
};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// What a single SSE event means for the delta stream.
#[derive(Debug, PartialEq, Eq)]
enum ChunkOutcome {
    Delta(String),
    Done,
}

fn parse_event_data(data: &str) -> Result<ChunkOutcome, UpstreamError> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(ChunkOutcome::Done);
    }
    if data.is_empty() {
        return Ok(ChunkOutcome::Delta(String::new()));
    }

    let chunk: StreamChunk =
        serde_json::from_str(data).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    if let Some(err) = chunk.error {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(UpstreamError::Provider(message));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .unwrap_or_default();
    Ok(ChunkOutcome::Delta(content))
}

/// Turn a stream of SSE events into text deltas.
///
/// Stops after `[DONE]` or after the first error, whichever comes first.
pub fn decode_sse_events<S, E>(events: S) -> DeltaStream
where
    S: Stream<Item = Result<Event, E>> + Send + 'static,
    E: Display + 'static,
{
    let deltas = events
        .map(|event| match event {
            Ok(event) => parse_event_data(&event.data),
            Err(e) => Err(UpstreamError::Stream(e.to_string())),
        })
        .scan(false, |finished, item| {
            if *finished {
                return futures::future::ready(None);
            }
            let out = match item {
                Ok(ChunkOutcome::Done) => None,
                Ok(ChunkOutcome::Delta(text)) => Some(Some(Ok(text))),
                Err(e) => {
                    *finished = true;
                    Some(Some(Err(e)))
                }
            };
            futures::future::ready(out)
        })
        .filter_map(futures::future::ready);

    Box::pin(deltas)
}

/// Streaming client for OpenAI-compatible chat completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client from upstream configuration. Requires the API key to be set.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| UpstreamError::MissingApiKey(config.api_key_env.clone()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("notes-stream/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: config.completions_url(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn stream_chat(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<DeltaStream, UpstreamError> {
        debug!(url = %self.url, model = %request.model, "Opening upstream stream");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Upstream rejected completion request");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_sse_events(response.bytes_stream().eventsource()))
    }
}
