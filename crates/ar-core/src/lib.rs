//! Shared data model for the agent runtime: messages, chat wire shapes,
//! events, skills and agent registry entries.
//!
//! This crate has no I/O of its own — it only defines the types that flow
//! between `ar-session`, `ar-tools`, `ar-providers`, `ar-skills` and
//! `ar-runtime`, matching the canonical wire shapes from spec.md §3/§6.

pub mod agent_entry;
pub mod chat;
pub mod error;
pub mod event;
pub mod message;
pub mod skill;

pub use agent_entry::{AgentEntry, AgentKind};
pub use chat::{ApiError, ChatChoice, ChatOutput};
pub use error::CoreError;
pub use event::Event;
pub use message::{Message, Role, ToolCall, ToolCallFunction};
pub use skill::Skill;
