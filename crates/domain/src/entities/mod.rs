//! Domain entities

mod npc;
mod quest;

pub use npc::Npc;
pub use quest::{Quest, QuestStatus};
