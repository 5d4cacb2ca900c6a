//! Value objects

mod dialogue;
mod position;

pub use dialogue::{DialogueRole, DialogueTurn};
pub use position::Position;
