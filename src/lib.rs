//! Lead intake: sales chatbot engine that turns website chats into leads.

pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
