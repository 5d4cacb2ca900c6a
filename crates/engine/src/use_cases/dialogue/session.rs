//! Per-NPC dialogue session.

use emberglen_domain::{DialogueTurn, NpcId};

use crate::entities::CharacterChat;

/// Open/closed state, visible history and backend binding of one NPC's chat.
///
/// Created on the first open and kept for the rest of the game; closing only
/// hides it.
pub struct DialogueSession {
    npc_id: NpcId,
    history: Vec<DialogueTurn>,
    is_open: bool,
    /// Set while a backend reply is pending; further submits are rejected.
    in_flight: bool,
    chat: CharacterChat,
}

impl DialogueSession {
    pub fn new(npc_id: NpcId, chat: CharacterChat) -> Self {
        Self {
            npc_id,
            history: Vec::new(),
            is_open: false,
            in_flight: false,
            chat,
        }
    }

    pub fn npc_id(&self) -> NpcId {
        self.npc_id
    }

    pub fn history(&self) -> &[DialogueTurn] {
        &self.history
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    pub(crate) fn push(&mut self, turn: DialogueTurn) {
        self.history.push(turn);
    }

    pub(crate) fn chat(&self) -> &CharacterChat {
        &self.chat
    }

    pub(crate) fn chat_mut(&mut self) -> &mut CharacterChat {
        &mut self.chat
    }
}
