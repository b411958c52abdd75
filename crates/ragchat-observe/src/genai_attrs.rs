//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! Field names for `tracing` spans around model calls, so retrieval and
//! generation spans line up with other GenAI telemetry. Span names follow
//! `"{operation} {model}"`, e.g. `"chat gemini-2.5-flash"`.

// --- Required attributes ---

/// The operation being performed (see the `OP_*` values).
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The provider serving the call (see the `PROVIDER_*` values).
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Finish reasons reported by the provider (e.g. "end_turn", "max_tokens").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Answer generation.
pub const OP_CHAT: &str = "chat";

/// Follow-up question rewritten into a standalone query.
pub const OP_REWRITE_QUERY: &str = "rewrite_query";

/// Query embedding ahead of retrieval.
pub const OP_EMBED_QUERY: &str = "embed_query";

/// Nearest-neighbour lookup in the vector index.
pub const OP_RETRIEVE: &str = "retrieve";

// --- Provider name values ---

pub const PROVIDER_GEMINI: &str = "gemini";

pub const PROVIDER_OPENAI: &str = "openai";

pub const PROVIDER_PINECONE: &str = "pinecone";

/// Name of `operation` against `model`, as used for span names.
pub fn span_name(operation: &str, model: &str) -> String {
    if model.is_empty() {
        operation.to_string()
    } else {
        format!("{operation} {model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_name() {
        assert_eq!(span_name(OP_CHAT, "gemini-2.5-flash"), "chat gemini-2.5-flash");
        assert_eq!(span_name(OP_RETRIEVE, ""), "retrieve");
    }
}
