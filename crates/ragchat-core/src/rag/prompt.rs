//! Prompt assembly for answer generation.

use ragchat_types::chat::ChatMessage;
use ragchat_types::llm::{Message, MessageRole};
use ragchat_types::retrieval::RetrievedChunk;

/// Separator placed between retrieved passages in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Placeholder replaced with the retrieved passages.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Built-in tutor prompt. `{context}` is replaced with the retrieved passages.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a Data Structures and Algorithms (DSA) expert assistant. Your job is to help learners understand DSA concepts clearly.

CONTEXT FROM KNOWLEDGE BASE:
{context}

HOW TO RESPOND:

1. First decide whether the question is about data structures, algorithms, programming, or computer science.

2. If it is NOT:
   - Acknowledge the question politely.
   - Explain that you specialise in DSA.
   - Suggest the "Start Discussion" button in the sidebar for anything else; it reaches the team directly.
   - Offer DSA topics you can help with: arrays, strings and linked lists; trees, graphs and hash tables; sorting and searching; dynamic programming; time and space complexity.

3. If it IS:
   - Answer ONLY from the context above.
   - If the context does not contain the answer, reply exactly:
     I could not find the answer in the provided document ☹️. Could you rephrase your question or ask something else about Data Structures and Algorithms?
   - Keep explanations clear, concise, and educational.
   - Use bullet points or short sentences to highlight key ideas.
   - Include code examples in fenced code blocks with a language tag.
   - State time and space complexity when it is relevant.
   - Break complex ideas into small steps and be encouraging."#;

/// Join retrieved passages into the context block, best match first.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Substitute the context block into a prompt template.
///
/// Templates without a placeholder get the context appended under a
/// heading so retrieved passages are never silently dropped.
pub fn render_system_prompt(template: &str, context: &str) -> String {
    if template.contains(CONTEXT_PLACEHOLDER) {
        template.replace(CONTEXT_PLACEHOLDER, context)
    } else {
        format!("{template}\n\nCONTEXT FROM KNOWLEDGE BASE:\n{context}")
    }
}

/// Convert stored turns into LLM messages. System turns are never stored,
/// but are skipped here regardless.
pub fn history_messages(history: &[ChatMessage]) -> Vec<Message> {
    history
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| Message {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn chunk(text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: format!("id-{score}"),
            score,
            text: text.to_string(),
            source: None,
        }
    }

    #[test]
    fn test_build_context_joins_with_separator() {
        let context = build_context(&[chunk("first", 0.9), chunk("second", 0.8)]);
        assert_eq!(context, "first\n\n---\n\nsecond");
    }

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_default_prompt_has_placeholder_and_fallback_line() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains(CONTEXT_PLACEHOLDER));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("I could not find the answer in the provided document"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("Start Discussion"));
    }

    #[test]
    fn test_render_system_prompt_substitutes() {
        let rendered = render_system_prompt("Context:\n{context}\nEnd", "heaps");
        assert_eq!(rendered, "Context:\nheaps\nEnd");
    }

    #[test]
    fn test_render_system_prompt_without_placeholder_appends() {
        let rendered = render_system_prompt("Be brief.", "heaps");
        assert!(rendered.starts_with("Be brief."));
        assert!(rendered.ends_with("CONTEXT FROM KNOWLEDGE BASE:\nheaps"));
    }

    #[test]
    fn test_history_messages_keeps_order_and_roles() {
        let chat_id = Uuid::now_v7();
        let turns = [
            (MessageRole::User, "What is a stack?"),
            (MessageRole::Assistant, "LIFO."),
        ];
        let history: Vec<ChatMessage> = turns
            .iter()
            .enumerate()
            .map(|(i, (role, content))| ChatMessage {
                id: Uuid::now_v7(),
                chat_id,
                seq: i as u32 + 1,
                role: *role,
                content: content.to_string(),
                created_at: Utc::now(),
            })
            .collect();

        let messages = history_messages(&history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].content, "LIFO.");
    }
}
