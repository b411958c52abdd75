//! Chat transcript persistence and bookkeeping.
//!
//! `ChatRepository` is the port the infrastructure layer implements;
//! `ChatService` holds the session rules (find-or-create, append order,
//! identifier format); `transcript` renders a session for export.

pub mod repository;
pub mod service;
pub mod transcript;
