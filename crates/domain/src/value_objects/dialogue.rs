//! Dialogue turns shown in an NPC chat log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a line of dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueRole {
    /// Typed by the player
    Player,
    /// Spoken by the NPC (backend replies and quest announcements)
    Character,
    /// Local notice, e.g. the backend being unreachable. Never sent to the backend.
    System,
}

impl fmt::Display for DialogueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Character => write!(f, "character"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One line in a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: DialogueRole,
    /// Display name of the speaker ("Player" or the NPC's given name)
    pub speaker: String,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl DialogueTurn {
    pub fn new(
        role: DialogueRole,
        speaker: impl Into<String>,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            role,
            speaker: speaker.into(),
            text: text.into(),
            at,
        }
    }

    pub fn is_player(&self) -> bool {
        self.role == DialogueRole::Player
    }
}
