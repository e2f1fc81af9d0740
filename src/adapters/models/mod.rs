//! Chat model adapters.

pub mod anthropic;
pub mod scripted;

pub use anthropic::{AnthropicChatModel, AnthropicConfig};
pub use scripted::{ScriptedChatModel, ScriptedStep};
