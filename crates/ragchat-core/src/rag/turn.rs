//! A single chat turn: load history, answer, persist.
//!
//! The session is created up front so a new conversation gets its
//! identifier even when generation fails. The user and assistant turns are
//! appended together only after an answer exists, so a failed request
//! leaves no dangling question in the transcript.

use ragchat_types::chat::ChatSession;
use ragchat_types::error::ChatError;
use tracing::info;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::llm::provider::LlmProvider;
use crate::rag::pipeline::{RagAnswer, RagPipeline};
use crate::retrieval::embedder::Embedder;
use crate::retrieval::index::VectorIndex;

/// Outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session: ChatSession,
    pub answer: RagAnswer,
}

/// Answer `question` inside the user's session and record the exchange.
#[tracing::instrument(name = "chat_turn", skip(chat, pipeline, question), fields(user_id = %user_id))]
pub async fn answer_turn<C, P, E, V>(
    chat: &ChatService<C>,
    pipeline: &RagPipeline<P, E, V>,
    user_id: Uuid,
    session_id: &str,
    question: &str,
) -> Result<TurnOutcome, ChatError>
where
    C: ChatRepository,
    P: LlmProvider,
    E: Embedder,
    V: VectorIndex,
{
    let question = question.trim();
    if question.is_empty() || session_id.trim().is_empty() {
        return Err(ChatError::Validation(
            "Message and sessionId are required".to_string(),
        ));
    }

    let session = chat.get_or_create_session(user_id, session_id).await?;
    let history = chat.repo().get_messages(&session.id).await?;

    let answer = pipeline.answer(question, &history).await?;

    chat.record_exchange(&session.id, question, &answer.answer)
        .await?;
    info!(session_id = %session.session_id, turns = history.len() + 2, "Chat turn completed");

    Ok(TurnOutcome { session, answer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::pipeline::RagSettings;
    use crate::testing::{InMemoryChatRepository, MockEmbedder, MockIndex, MockLlm};
    use ragchat_types::chat::MessageRole;
    use ragchat_types::config::AppConfig;

    fn pipeline(llm: MockLlm) -> RagPipeline<MockLlm, MockEmbedder, MockIndex> {
        RagPipeline::new(
            llm,
            MockEmbedder::new(4),
            MockIndex::default(),
            RagSettings::from_config(&AppConfig::default(), None),
        )
    }

    #[tokio::test]
    async fn test_turn_persists_question_then_answer() {
        let chat = ChatService::new(InMemoryChatRepository::default());
        let user = Uuid::now_v7();

        let outcome = answer_turn(&chat, &pipeline(MockLlm::replying(["LIFO."])), user, "s1", "What is a stack?")
            .await
            .unwrap();
        assert_eq!(outcome.answer.answer, "LIFO.");
        assert_eq!(outcome.session.session_id, "s1");

        let transcript = chat.history(user, "s1").await.unwrap().unwrap();
        let turns: Vec<(MessageRole, &str)> = transcript
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            turns,
            vec![(MessageRole::User, "What is a stack?"), (MessageRole::Assistant, "LIFO.")]
        );
    }

    #[tokio::test]
    async fn test_second_turn_sees_first() {
        let chat = ChatService::new(InMemoryChatRepository::default());
        let user = Uuid::now_v7();
        let llm = MockLlm::replying(["LIFO.", "How is a stack implemented?", "With an array."]);
        let pipeline = pipeline(llm.clone());

        answer_turn(&chat, &pipeline, user, "s1", "What is a stack?").await.unwrap();
        answer_turn(&chat, &pipeline, user, "s1", "How is it implemented?").await.unwrap();

        let transcript = chat.history(user, "s1").await.unwrap().unwrap();
        assert_eq!(transcript.messages.len(), 4);
        // The stored question is what the user typed, not the rewrite.
        assert_eq!(transcript.messages[2].content, "How is it implemented?");
        assert_eq!(transcript.messages[3].content, "With an array.");
    }

    #[tokio::test]
    async fn test_failed_generation_persists_nothing() {
        let chat = ChatService::new(InMemoryChatRepository::default());
        let user = Uuid::now_v7();

        let err = answer_turn(&chat, &pipeline(MockLlm::failing()), user, "s1", "What is a queue?")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));

        let transcript = chat.history(user, "s1").await.unwrap().unwrap();
        assert!(transcript.messages.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let chat = ChatService::new(InMemoryChatRepository::default());
        let user = Uuid::now_v7();

        let err = answer_turn(&chat, &pipeline(MockLlm::default()), user, "", "hi")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Message and sessionId are required");

        let err = answer_turn(&chat, &pipeline(MockLlm::default()), user, "s1", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }
}
