//! Shared constants used across the application

/// Instruction attached to every session when it is created.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful, expert AI assistant. You answer concisely and accurately. You use Markdown for formatting code and structured text.";

/// First message of a fresh conversation.
pub const WELCOME_MESSAGE: &str = "Hello! I'm powered by Google's Gemini models.\nI can help you with coding, writing, analysis, and more.\n\nHow can I assist you today?";

/// Replaces the content of a reply whose stream failed.
pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// Caption rendered under failed replies.
pub const ERROR_CAPTION: &str = "Failed to send message";

pub const DISCLAIMER: &str = "AI can make mistakes. Please verify important information.";

pub const APP_TITLE: &str = "Gemini Chat";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Announcement that opens the conversation after a model switch.
pub fn switched_model_message(model_id: &str) -> String {
    format!("Switched to {model_id}. How can I help?")
}
