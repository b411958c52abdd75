//! Plain-text rendering of a chat transcript, used for the emailed export.

use ragchat_types::chat::Transcript;

/// Render a transcript as:
///
/// ```text
/// Chat Session: session_1718000000000_k3j2h1g0f
///
/// USER:
/// What is a heap?
///
/// ASSISTANT:
/// A heap is ...
///
/// ```
pub fn render_text(transcript: &Transcript) -> String {
    let mut out = format!("Chat Session: {}\n\n", transcript.session.session_id);
    for message in &transcript.messages {
        out.push_str(&message.role.to_string().to_uppercase());
        out.push_str(":\n");
        out.push_str(&message.content);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ragchat_types::chat::{ChatMessage, ChatSession, MessageRole};
    use uuid::Uuid;

    fn message(chat_id: Uuid, seq: u32, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            chat_id,
            seq,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text_layout() {
        let session = ChatSession::new(Uuid::now_v7(), "session_1_abc");
        let chat_id = session.id;
        let transcript = Transcript {
            session,
            messages: vec![
                message(chat_id, 1, MessageRole::User, "What is a heap?"),
                message(chat_id, 2, MessageRole::Assistant, "A complete binary tree."),
            ],
        };

        assert_eq!(
            render_text(&transcript),
            "Chat Session: session_1_abc\n\nUSER:\nWhat is a heap?\n\nASSISTANT:\nA complete binary tree.\n\n"
        );
    }

    #[test]
    fn test_render_text_empty_transcript_has_header_only() {
        let transcript = Transcript {
            session: ChatSession::new(Uuid::now_v7(), "s"),
            messages: vec![],
        };
        assert_eq!(render_text(&transcript), "Chat Session: s\n\n");
    }
}
