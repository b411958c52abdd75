//! `ragchat ask`: run one question through the pipeline from the terminal.

use anyhow::Result;
use console::style;
use serde_json::json;
use tracing::Instrument;

use ragchat_infra::secret::Secrets;
use ragchat_observe::genai_attrs::{OP_CHAT, span_name};
use ragchat_types::config::AppConfig;

use crate::state::build_pipeline;

pub async fn ask(
    config: AppConfig,
    secrets: &Secrets,
    question: &str,
    no_context: bool,
    json: bool,
) -> Result<()> {
    let question = question.trim();
    anyhow::ensure!(!question.is_empty(), "question must not be empty");

    let pipeline = build_pipeline(&config, secrets).await?;
    let span = tracing::info_span!(
        "ask",
        gen_ai.operation.name = OP_CHAT,
        gen_ai.request.model = %config.llm.model,
        no_context,
    );
    tracing::debug!(operation = %span_name(OP_CHAT, &config.llm.model), "Asking");

    if no_context {
        let answer = pipeline
            .ask_without_context(question)
            .instrument(span)
            .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&json!({ "answer": answer }))?);
        } else {
            println!();
            println!("{answer}");
            println!();
        }
        return Ok(());
    }

    let result = pipeline.answer(question, &[]).instrument(span).await?;

    if json {
        let output = json!({
            "answer": result.answer,
            "query": result.rewritten_query,
            "sources": result.sources,
            "usage": result.usage,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("{}", result.answer);
    println!();
    if !result.sources.is_empty() {
        println!("  {}", style("── Sources ──").dim());
        for chunk in &result.sources {
            println!(
                "  {} {} {}",
                style("•").cyan(),
                chunk.source.as_deref().unwrap_or(&chunk.id),
                style(format!("({:.3})", chunk.score)).dim()
            );
        }
        println!();
    }
    println!(
        "  {}",
        style(format!(
            "{} input / {} output tokens",
            result.usage.input_tokens, result.usage.output_tokens
        ))
        .dim()
    );
    Ok(())
}
