//! One conversational turn: relay the completion to the caller, then store
//! the assistant's reply.

pub mod conversation;
pub mod events;
pub mod relay;

pub use events::StreamEvent;
pub use relay::{relay, AssistantReply, RelayOutcome};

use crate::completion::{ChatMessage, CompletionClient};
use crate::config::RetryPolicy;
use crate::db::message::MessageRepository;
use crate::models::Message;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A user turn that has been stored and is waiting for its reply.
pub struct PendingTurn {
    pub room_id: String,
    pub conversation: Vec<ChatMessage>,
}

/// Relay the reply to `turn` over `events` and persist it.
///
/// The assistant message is written before `done` is sent, and only if the
/// reply produced any text. If the write fails the caller gets an `error`
/// event instead of `done`.
pub async fn run_turn(
    client: Arc<dyn CompletionClient>,
    messages: MessageRepository,
    policy: RetryPolicy,
    turn: PendingTurn,
    events: mpsc::Sender<StreamEvent>,
) {
    let message_id = uuid::Uuid::new_v4().to_string();

    let reply = match relay(client.as_ref(), &turn.conversation, policy, &message_id, &events).await {
        RelayOutcome::Completed(reply) => reply,
        RelayOutcome::Failed | RelayOutcome::Cancelled => return,
    };

    if reply.content.is_empty() {
        tracing::info!("Completion for room {} produced no text; nothing stored", turn.room_id);
    } else {
        let query_routing = reply.routing.as_ref().map(|routing| routing.to_string());
        let message = Message::assistant(message_id, turn.room_id.clone(), reply.content, query_routing);

        if let Err(e) = messages.create(&message).await {
            tracing::error!("Failed to store assistant reply for room {}: {}", turn.room_id, e);
            let _ = events
                .send(StreamEvent::error("The reply could not be saved. Please try again."))
                .await;
            return;
        }
        tracing::info!(
            "Stored assistant reply {} for room {} ({} chars)",
            message.id,
            turn.room_id,
            message.content.chars().count()
        );
    }

    let _ = events.send(StreamEvent::Done).await;
}
