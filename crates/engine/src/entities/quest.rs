//! Quest registry.
//!
//! Owns every quest definition and its status, and enforces that at most one
//! quest is `Active` at a time. Transitions that are not allowed are silent
//! no-ops: they return `None` and leave the registry untouched.

use std::collections::HashMap;

use emberglen_domain::{Quest, QuestEvent, QuestId, QuestStatus};

#[derive(Debug, Default)]
pub struct QuestRegistry {
    quests: HashMap<QuestId, Quest>,
    current: Option<QuestId>,
}

impl QuestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quest definition. An id that is already registered is kept as-is.
    pub fn register(&mut self, mut quest: Quest) {
        if self.quests.contains_key(&quest.id) {
            tracing::warn!(quest_id = %quest.id, "Quest already registered, ignoring duplicate");
            return;
        }
        if quest.is_active() {
            if self.current.is_none() {
                self.current = Some(quest.id.clone());
            } else {
                tracing::warn!(quest_id = %quest.id, "Another quest is active, registering as inactive");
                quest.status = QuestStatus::Inactive;
            }
        }
        self.quests.insert(quest.id.clone(), quest);
    }

    pub fn get(&self, id: &QuestId) -> Option<&Quest> {
        self.quests.get(id)
    }

    pub fn status(&self, id: &QuestId) -> Option<QuestStatus> {
        self.quests.get(id).map(|q| q.status)
    }

    /// The quest currently being pursued
    pub fn current(&self) -> Option<&Quest> {
        self.current.as_ref().and_then(|id| self.quests.get(id))
    }

    /// Start an inactive quest.
    ///
    /// No-op when another quest is already active, or the quest is unknown or
    /// no longer inactive.
    pub fn activate(&mut self, id: &QuestId) -> Option<QuestEvent> {
        if let Some(current) = &self.current {
            tracing::debug!(
                quest_id = %id,
                active_quest = %current,
                "Quest not activated, another quest is active"
            );
            return None;
        }

        let quest = self.quests.get_mut(id)?;
        if !quest.is_inactive() {
            tracing::debug!(quest_id = %id, status = %quest.status, "Quest not activated");
            return None;
        }

        quest.status = QuestStatus::Active;
        self.current = Some(id.clone());
        tracing::info!(quest_id = %id, title = %quest.title, "Quest started");

        Some(QuestEvent::Started {
            quest_id: id.clone(),
            title: quest.title.clone(),
            description: quest.description.clone(),
        })
    }

    /// Finish the active quest. No-op for any quest that is not active.
    pub fn complete(&mut self, id: &QuestId) -> Option<QuestEvent> {
        let quest = self.quests.get_mut(id)?;
        if !quest.is_active() {
            tracing::debug!(quest_id = %id, status = %quest.status, "Quest not completed");
            return None;
        }

        quest.status = QuestStatus::Completed;
        self.current = None;
        tracing::info!(quest_id = %id, title = %quest.title, "Quest completed");

        Some(QuestEvent::Completed {
            quest_id: id.clone(),
            title: quest.title.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}
