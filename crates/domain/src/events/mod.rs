//! Domain Events
//!
//! Events emitted by the dialogue core when session or quest state changes.
//! The presentation layer consumes them to keep the chat panels, the log and
//! the quest banner in sync; it never mutates session state itself.

use serde::{Deserialize, Serialize};

use crate::{DialogueTurn, NpcId, QuestId};

/// Quest lifecycle transitions reported by the quest registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestEvent {
    Started {
        quest_id: QuestId,
        title: String,
        description: String,
    },
    Completed {
        quest_id: QuestId,
        title: String,
    },
}

impl QuestEvent {
    pub fn quest_id(&self) -> &QuestId {
        match self {
            Self::Started { quest_id, .. } | Self::Completed { quest_id, .. } => quest_id,
        }
    }
}

/// Session and quest changes, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogueEvent {
    SessionOpened {
        npc_id: NpcId,
        npc_name: String,
        /// Stable key for the NPC's chat panel
        panel: String,
        /// True the first time this NPC's panel is shown
        first_open: bool,
    },
    SessionClosed {
        npc_id: NpcId,
    },
    TurnAppended {
        npc_id: NpcId,
        turn: DialogueTurn,
    },
    Quest(QuestEvent),
}

impl DialogueEvent {
    /// NPC the event concerns, if it is tied to a session
    pub fn npc_id(&self) -> Option<NpcId> {
        match self {
            Self::SessionOpened { npc_id, .. }
            | Self::SessionClosed { npc_id }
            | Self::TurnAppended { npc_id, .. } => Some(*npc_id),
            Self::Quest(_) => None,
        }
    }
}
