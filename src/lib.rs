//! gemchat is a full-screen terminal chat client for Google's Gemini models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the request and response payloads of the Gemini
//!   streaming endpoint.
//! - [`core`] owns the conversation, the chat session adapter, the
//!   streaming state machine and persisted configuration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`cli`] parses arguments and dispatches to the chat UI or the one-shot
//!   commands.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
