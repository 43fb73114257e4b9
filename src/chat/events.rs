use serde::Serialize;

/// One frame of the reply stream sent back to the caller.
///
/// A stream carries any number of `Content` frames, at most one `Routing`
/// frame, and ends with exactly one `Error` or `Done`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Content {
        content: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Routing {
        routing: serde_json::Value,
    },
    Error {
        error: String,
    },
    Done,
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        let content = StreamEvent::Content {
            content: "Hi".into(),
            message_id: "m-1".into(),
        };
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({"type": "content", "content": "Hi", "messageId": "m-1"})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::Routing { routing: json!({"selected_model": "a"}) }).unwrap(),
            json!({"type": "routing", "routing": {"selected_model": "a"}})
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::error("nope")).unwrap(),
            json!({"type": "error", "error": "nope"})
        );
        assert_eq!(serde_json::to_string(&StreamEvent::Done).unwrap(), r#"{"type":"done"}"#);
    }
}
