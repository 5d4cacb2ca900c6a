//! Village scene coordination.
//!
//! Ties the player body, the placed NPCs and the proximity gate to the
//! dialogue session manager. The scene never holds dialogue state itself.

use std::sync::Arc;

use emberglen_domain::{Npc, NpcId, Position};

use crate::entities::{NpcRoster, ProximityGate};
use crate::infrastructure::ports::CursorStyle;
use crate::infrastructure::roster::VillageRoster;
use crate::use_cases::dialogue::{DialogueSessionManager, OpenOutcome};
use crate::use_cases::movement::{MovementInput, PlayerBody};

/// Result of clicking an NPC
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractOutcome {
    Opened { first_open: bool },
    OutOfRange { distance: f32 },
    AlreadyOpen,
    UnknownNpc,
}

pub struct Village {
    player: PlayerBody,
    npcs: NpcRoster,
    gate: ProximityGate,
    dialogue: Arc<DialogueSessionManager>,
    /// Player velocity at the moment movement last closed a chat
    #[cfg(test)]
    velocity_at_close: Option<(f32, f32)>,
}

impl Village {
    pub fn new(player_start: Position, gate: ProximityGate, dialogue: Arc<DialogueSessionManager>) -> Self {
        Self {
            player: PlayerBody::new(player_start),
            npcs: NpcRoster::new(),
            gate,
            dialogue,
            #[cfg(test)]
            velocity_at_close: None,
        }
    }

    /// Build a village from a roster, registering its NPCs and quests.
    pub async fn from_roster(
        roster: VillageRoster,
        gate: ProximityGate,
        dialogue: Arc<DialogueSessionManager>,
    ) -> Self {
        let mut village = Self::new(roster.player_start, gate, dialogue);
        for quest in roster.quests {
            village.dialogue.register_quest(quest).await;
        }
        for npc in roster.npcs {
            village.add_npc(npc).await;
        }
        village
    }

    pub async fn add_npc(&mut self, npc: Npc) {
        self.dialogue.register_npc(&npc).await;
        tracing::debug!(npc_id = %npc.id, name = %npc.name, x = npc.position.x, y = npc.position.y, "NPC placed");
        self.npcs.insert(npc);
    }

    pub async fn remove_npc(&mut self, npc_id: NpcId) -> Option<Npc> {
        self.dialogue.remove_npc(npc_id).await;
        self.npcs.remove(npc_id)
    }

    pub fn player(&self) -> &PlayerBody {
        &self.player
    }

    pub fn npcs(&self) -> &NpcRoster {
        &self.npcs
    }

    pub fn dialogue(&self) -> &Arc<DialogueSessionManager> {
        &self.dialogue
    }

    pub fn in_range(&self, npc_id: NpcId) -> bool {
        self.npcs
            .get(npc_id)
            .is_some_and(|npc| self.gate.in_range(&self.player.position(), &npc.position))
    }

    /// Open the NPC's chat if the player stands close enough.
    pub async fn interact(&self, npc_id: NpcId) -> InteractOutcome {
        let Some(npc) = self.npcs.get(npc_id) else {
            return InteractOutcome::UnknownNpc;
        };
        let player = self.player.position();
        if !self.gate.in_range(&player, &npc.position) {
            let distance = player.distance_to(&npc.position);
            tracing::debug!(npc_id = %npc_id, distance, "NPC out of interaction range");
            return InteractOutcome::OutOfRange { distance };
        }

        match self.dialogue.open(npc_id).await {
            OpenOutcome::Opened { first_open } => InteractOutcome::Opened { first_open },
            OpenOutcome::AlreadyOpen => InteractOutcome::AlreadyOpen,
            OpenOutcome::UnknownNpc => InteractOutcome::UnknownNpc,
        }
    }

    /// Cursor to show while hovering an NPC
    pub fn cursor_for(&self, npc_id: NpcId) -> CursorStyle {
        if self.in_range(npc_id) {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        }
    }

    /// Advance one frame. Any held direction closes an open chat before the
    /// player starts moving.
    pub async fn tick(&mut self, input: &MovementInput, dt: f32) -> Position {
        if input.any() {
            if let Some(npc_id) = self.dialogue.close().await {
                tracing::debug!(npc_id = %npc_id, "Chat closed by movement");
                #[cfg(test)]
                {
                    self.velocity_at_close = Some(self.player.velocity());
                }
            }
        }
        self.player.apply_input(input);
        self.player.step(dt)
    }
}
