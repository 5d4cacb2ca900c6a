//! NPC entity - A villager the player can talk to
//!
//! Each NPC has a fixed personality (`character_description`), which is fed
//! to the chat backend as its system prompt, and may hand out one quest.

use serde::{Deserialize, Serialize};

use crate::{DomainError, NpcId, Position, QuestId};

/// A non-player character placed in the village
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    /// Display name used in name bars and chat log lines
    pub name: String,
    /// Personality prompt handed to the chat backend
    pub character_description: String,
    pub position: Position,
    /// Quest this NPC offers, if any
    pub quest: Option<QuestId>,
}

impl Npc {
    pub fn new(
        name: impl Into<String>,
        character_description: impl Into<String>,
        position: Position,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("NPC name cannot be empty"));
        }
        let character_description = character_description.into();
        if character_description.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "NPC '{}' needs a character description",
                name
            )));
        }
        Ok(Self {
            id: NpcId::new(),
            name,
            character_description,
            position,
            quest: None,
        })
    }

    pub fn with_id(mut self, id: NpcId) -> Self {
        self.id = id;
        self
    }

    pub fn with_quest(mut self, quest: QuestId) -> Self {
        self.quest = Some(quest);
        self
    }

    /// Stable key for this NPC's chat panel, derived from its personality.
    ///
    /// Whitespace runs collapse to a single `-` and the result is lowercased.
    pub fn panel_slug(&self) -> String {
        let slug = self
            .character_description
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("chat-log-{}", slug)
    }
}
