//! Emberglen domain layer.
//!
//! Pure types for the village dialogue core: NPCs, quests, dialogue turns and
//! the events emitted when they change. Nothing in here performs I/O.

extern crate self as emberglen_domain;

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use entities::{Npc, Quest, QuestStatus};
pub use error::DomainError;
pub use events::{DialogueEvent, QuestEvent};
pub use ids::{NpcId, QuestId};
pub use value_objects::{DialogueRole, DialogueTurn, Position};
