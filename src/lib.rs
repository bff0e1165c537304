// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod error;
pub mod judge;
pub mod llm;
pub mod opponent;
pub mod prompts;
pub mod protocol;
pub mod report;
pub mod state;
pub mod types;
