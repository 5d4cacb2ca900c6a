//! Use cases - User story orchestration.
//!
//! Each module coordinates entity modules for one area of play.

pub mod dialogue;
pub mod movement;
pub mod village;

pub use dialogue::{DialogueSessionManager, OpenOutcome, SubmitOutcome};
pub use movement::{MovementInput, PlayerBody};
pub use village::{InteractOutcome, Village};
