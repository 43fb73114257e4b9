//! The completion capability: something that takes an ordered conversation
//! and streams back the model's reply in increments.

pub mod client;
pub mod types;

pub use client::OpenAiClient;
pub use types::ChatMessage;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// One increment of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionChunk {
    pub content: Option<String>,
    /// Raw routing metadata, if the provider attached any to this chunk.
    pub routing: Option<serde_json::Value>,
}

impl CompletionChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            routing: None,
        }
    }
}

pub type ChunkStream = BoxStream<'static, Result<CompletionChunk, CompletionError>>;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The provider answered with a 5xx status.
    #[error("completion service error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("completion request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed completion stream: {0}")]
    Decode(String),

    /// The provider reported an error inside an otherwise healthy stream.
    #[error("completion stream error: {0}")]
    Upstream(String),
}

impl CompletionError {
    /// Server-side failures are worth retrying; nothing else is.
    pub fn is_transient(&self) -> bool {
        matches!(self, CompletionError::Server { .. })
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submit `messages` and return the reply as a stream of chunks. Errors
    /// may surface here (the request was refused) or later, inside the stream.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, CompletionError>;
}
