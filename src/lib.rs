//! Math Practice: chat client for generated math practice questions.

pub mod api;
pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;
