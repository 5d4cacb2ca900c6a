//! Dialogue use cases: per-NPC chat sessions and quest triggering.

mod manager;
mod session;

pub use manager::{
    DialogueSessionManager, OpenOutcome, SubmitOutcome, PLAYER_DISPLAY_NAME, QUEST_BLOCKED_NOTICE,
    SYSTEM_DISPLAY_NAME,
};
pub use session::DialogueSession;
