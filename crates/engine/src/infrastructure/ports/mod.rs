//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (could swap Ollama -> Claude/OpenAI)
//! - The presentation surface (browser overlay, terminal)
//! - Clock (for testing)

mod error;
mod external;
mod testing;
mod ui;

pub use error::LlmError;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

// =============================================================================
// Presentation Port
// =============================================================================
pub use ui::{CursorStyle, LogEntry, UiPort, CHARACTER_COLOR, PLAYER_COLOR, SYSTEM_COLOR};

// =============================================================================
// Testability Ports
// =============================================================================
pub use testing::ClockPort;

#[cfg(test)]
pub use external::MockLlmPort;
#[cfg(test)]
pub use testing::MockClockPort;
#[cfg(test)]
pub use ui::MockUiPort;
