//! Quest trigger detection.
//!
//! Player input mentioning a quest keyword starts the talking NPC's quest
//! instead of going to the chat backend.

use emberglen_domain::{QuestEvent, QuestId};

use super::quest::QuestRegistry;

/// Words that make an NPC offer its quest
pub const QUEST_KEYWORDS: [&str; 3] = ["quest", "help", "task"];

/// Input that mentioned a keyword to an NPC whose quest is inactive.
/// Either way the input is consumed and never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Started(QuestEvent),
    /// Another quest is active, so this one stayed inactive
    Blocked(QuestId),
}

#[derive(Debug, Clone)]
pub struct TriggerDetector {
    keywords: Vec<String>,
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new(QUEST_KEYWORDS)
    }
}

impl TriggerDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive substring match against the keyword set.
    pub fn mentions_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Consume `text` when it mentions a keyword and `quest` is inactive,
    /// starting the quest if no other quest is active.
    ///
    /// `Some` means the caller must skip the backend for this input.
    pub fn detect(
        &self,
        text: &str,
        quest: Option<&QuestId>,
        registry: &mut QuestRegistry,
    ) -> Option<Trigger> {
        let quest = quest?;
        if !self.mentions_keyword(text) {
            return None;
        }
        if !registry.get(quest)?.is_inactive() {
            return None;
        }
        match registry.activate(quest) {
            Some(event) => Some(Trigger::Started(event)),
            None => Some(Trigger::Blocked(quest.clone())),
        }
    }
}
