pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod gemini;
pub mod message;
pub mod models;
pub mod session;
pub mod store;
