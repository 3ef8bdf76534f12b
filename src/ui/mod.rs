//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that maps input to store operations
//!   and forwards dispatched reply streams back into the store.
//! - [`renderer`] and [`markdown`]: view composition and frame output.
//! - [`state`]: input buffer, focus, sidebar cursor and scroll position.
//! - [`theme`]: color and style policy.
//!
//! Conversation state is owned by [`crate::core::store`]; this layer only
//! presents it and captures interaction.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod state;
pub mod theme;
