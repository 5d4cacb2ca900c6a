//! Quest entity - A named objective handed out by an NPC
//!
//! Quests follow a three-state lifecycle:
//!
//! ```text
//! Inactive --activate--> Active --complete--> Completed
//! ```
//!
//! Transitions are driven by the quest registry in the engine, which also
//! guarantees that at most one quest is `Active` at a time. A quest is never
//! removed once defined.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DomainError, QuestId};

/// Lifecycle state of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Not yet offered to the player
    #[default]
    Inactive,
    /// Currently being pursued (at most one quest at a time)
    Active,
    /// Finished; never reactivated
    Completed,
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for QuestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "completed" | "complete" => Ok(Self::Completed),
            other => Err(DomainError::validation(format!(
                "Unknown quest status: {}",
                other
            ))),
        }
    }
}

/// A quest definition together with its current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    /// Short title shown in the quest banner (e.g. "Gather Magical Herbs")
    pub title: String,
    /// One-line description announced when the quest starts
    pub description: String,
    #[serde(default)]
    pub status: QuestStatus,
}

impl Quest {
    /// Create a new, inactive quest.
    pub fn new(
        id: QuestId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "quest '{}' needs a title",
                id
            )));
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            status: QuestStatus::Inactive,
        })
    }

    pub fn is_inactive(&self) -> bool {
        self.status == QuestStatus::Inactive
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    /// Text announced by the quest giver when the quest starts.
    pub fn announcement(&self) -> String {
        format!("New Quest: {}\n{}", self.title, self.description)
    }
}
