//! Observability setup for ragchat: tracing subscriber, optional
//! OpenTelemetry export, and GenAI span attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
