use crate::completion::ChatMessage;
use crate::models::Message;

/// Build the conversation submitted for completion: the room's history in
/// stored order, followed by the new user turn.
pub fn assemble(history: &[Message], content: &str) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|message| ChatMessage {
            role: message.role,
            content: message.content.clone(),
        })
        .chain(std::iter::once(ChatMessage::user(content)))
        .collect()
}
