//! Accounts: signup, login, and bearer-token authentication.

pub mod hasher;
pub mod repository;
pub mod service;
