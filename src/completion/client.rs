use super::types::{ChatCompletionChunk, ChatCompletionRequest};
use super::{ChatMessage, ChunkStream, CompletionChunk, CompletionClient, CompletionError};
use crate::config::CompletionConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Event, EventSource};
use std::time::Duration;

/// Streaming client for OpenAI-compatible chat completion APIs
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        // No overall timeout: a streamed reply may legitimately take minutes.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: completions_url(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Append `/chat/completions` unless the configured URL already points there.
fn completions_url(base_url: &str) -> String {
    if base_url.contains("/chat/completions") {
        base_url.to_string()
    } else {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, CompletionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request);

        let mut source = EventSource::new(builder)
            .map_err(|e| CompletionError::Decode(format!("request cannot be streamed: {e}")))?;
        // Reconnecting would silently restart the reply; retries belong to the caller.
        source.set_retry_policy(Box::new(Never));

        tracing::debug!(model = %self.model, messages = messages.len(), "Opened completion stream");
        Ok(futures::stream::unfold(Some(source), next_chunk).boxed())
    }
}

async fn next_chunk(
    state: Option<EventSource>,
) -> Option<(Result<CompletionChunk, CompletionError>, Option<EventSource>)> {
    let mut source = state?;
    loop {
        match source.next().await {
            Some(Ok(Event::Open)) => continue,
            Some(Ok(Event::Message(message))) => {
                let data = message.data.trim();
                if data == "[DONE]" {
                    source.close();
                    return None;
                }
                return match parse_chunk(data) {
                    Ok(chunk) => Some((Ok(chunk), Some(source))),
                    Err(e) => {
                        source.close();
                        Some((Err(e), None))
                    }
                };
            }
            Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => return None,
            Some(Err(err)) => {
                source.close();
                return Some((Err(classify(err).await), None));
            }
        }
    }
}

fn parse_chunk(data: &str) -> Result<CompletionChunk, CompletionError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| CompletionError::Decode(format!("{e}: {data}")))?;

    if let Some(message) = chunk.error_message() {
        return Err(CompletionError::Upstream(message));
    }

    Ok(CompletionChunk {
        content: chunk.content().map(str::to_string),
        routing: chunk.query_routing.filter(|routing| !routing.is_null()),
    })
}

async fn classify(err: reqwest_eventsource::Error) -> CompletionError {
    use reqwest_eventsource::Error as SseError;

    match err {
        SseError::InvalidStatusCode(status, response) => {
            let message = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                CompletionError::Server {
                    status: status.as_u16(),
                    message,
                }
            } else {
                CompletionError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
        }
        SseError::Transport(e) => CompletionError::Transport(e),
        SseError::InvalidContentType(content_type, _) => {
            CompletionError::Decode(format!("unexpected content type {content_type:?}"))
        }
        other => CompletionError::Decode(other.to_string()),
    }
}
