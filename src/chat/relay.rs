use super::events::StreamEvent;
use crate::completion::{ChatMessage, CompletionChunk, CompletionClient, CompletionError};
use crate::config::RetryPolicy;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

/// Sent to the caller once every attempt has failed transiently.
pub const TRANSIENT_FAILURE_MESSAGE: &str =
    "The AI service is temporarily unavailable. Please try again in a moment.";

/// Text and metadata gathered over one relayed reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    /// Concatenation of every forwarded `content` frame, in order.
    pub content: String,
    pub routing: Option<Value>,
}

#[derive(Debug, PartialEq)]
pub enum RelayOutcome {
    /// The completion finished; no terminal event has been sent yet.
    Completed(AssistantReply),
    /// A terminal `error` event has been sent.
    Failed,
    /// The caller stopped listening.
    Cancelled,
}

enum AttemptError {
    Disconnected,
    Completion(CompletionError),
}

impl From<CompletionError> for AttemptError {
    fn from(err: CompletionError) -> Self {
        AttemptError::Completion(err)
    }
}

/// Drive one completion for `conversation`, forwarding each increment to
/// `events` as soon as it arrives.
///
/// Transient failures restart the request from scratch after
/// `policy.backoff`, up to `policy.max_retries` times. Text already forwarded
/// by a failed attempt stays in the reply, since the caller has seen it.
/// Routing metadata is forwarded at most once per reply.
pub async fn relay(
    client: &dyn CompletionClient,
    conversation: &[ChatMessage],
    policy: RetryPolicy,
    message_id: &str,
    events: &mpsc::Sender<StreamEvent>,
) -> RelayOutcome {
    let mut reply = AssistantReply::default();
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        tracing::debug!(attempt, max_attempts, messages = conversation.len(), "Requesting completion");

        match stream_attempt(client, conversation, message_id, events, &mut reply).await {
            Ok(()) => return RelayOutcome::Completed(reply),
            Err(AttemptError::Disconnected) => {
                tracing::info!("Caller disconnected, abandoning completion {}", message_id);
                return RelayOutcome::Cancelled;
            }
            Err(AttemptError::Completion(err)) if err.is_transient() => {
                tracing::warn!(attempt, max_attempts, error = %err, "Transient completion failure");
                if attempt < max_attempts {
                    tracing::info!("Retrying completion in {:?}", policy.backoff);
                    tokio::select! {
                        _ = events.closed() => return RelayOutcome::Cancelled,
                        _ = tokio::time::sleep(policy.backoff) => continue,
                    }
                }
                let _ = events.send(StreamEvent::error(TRANSIENT_FAILURE_MESSAGE)).await;
                return RelayOutcome::Failed;
            }
            Err(AttemptError::Completion(err)) => {
                tracing::error!(error = %err, "Completion failed");
                let _ = events
                    .send(StreamEvent::error(format!("Completion API call failed: {err}")))
                    .await;
                return RelayOutcome::Failed;
            }
        }
    }
}

async fn stream_attempt(
    client: &dyn CompletionClient,
    conversation: &[ChatMessage],
    message_id: &str,
    events: &mpsc::Sender<StreamEvent>,
    reply: &mut AssistantReply,
) -> Result<(), AttemptError> {
    let mut stream = tokio::select! {
        _ = events.closed() => return Err(AttemptError::Disconnected),
        result = client.stream_chat(conversation) => result?,
    };

    loop {
        let next = tokio::select! {
            _ = events.closed() => return Err(AttemptError::Disconnected),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            return Ok(());
        };
        forward_chunk(chunk?, message_id, events, reply).await?;
    }
}

async fn forward_chunk(
    chunk: CompletionChunk,
    message_id: &str,
    events: &mpsc::Sender<StreamEvent>,
    reply: &mut AssistantReply,
) -> Result<(), AttemptError> {
    if let Some(content) = chunk.content.filter(|content| !content.is_empty()) {
        reply.content.push_str(&content);
        send(
            events,
            StreamEvent::Content {
                content,
                message_id: message_id.to_string(),
            },
        )
        .await?;
    }

    if reply.routing.is_none() {
        if let Some(raw) = chunk.routing {
            match routing_metadata(raw) {
                Some(routing) => {
                    reply.routing = Some(routing.clone());
                    send(events, StreamEvent::Routing { routing }).await?;
                }
                None => tracing::debug!("Skipping empty routing metadata"),
            }
        }
    }

    Ok(())
}

/// Routing metadata is opaque; empty values (`null`, `false`, `0`, `""`,
/// `[]`, `{}`) count as absent so a later chunk can still supply it.
fn routing_metadata(raw: Value) -> Option<Value> {
    let present = match &raw {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    };
    present.then_some(raw)
}

async fn send(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), AttemptError> {
    events.send(event).await.map_err(|_| AttemptError::Disconnected)
}
