//! Prompt building: system prompt assembly and the static tool catalog.

pub mod system;
pub mod tools;

pub use system::{PromptContext, build_system_prompt};
pub use tools::{ToolCapabilities, available_tools};
