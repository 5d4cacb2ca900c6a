//! Entity modules.
//!
//! Each module wraps one piece of village state and its rules. Use cases
//! compose them; nothing here knows about the presentation layer.

pub mod character_chat;
pub mod npc;
pub mod proximity;
pub mod quest;
pub mod trigger;

pub use character_chat::CharacterChat;
pub use npc::NpcRoster;
pub use proximity::ProximityGate;
pub use quest::QuestRegistry;
pub use trigger::{Trigger, TriggerDetector};
