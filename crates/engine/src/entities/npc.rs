//! NPC roster entity module.
//!
//! Keeps the village's NPCs keyed by stable id, preserving placement order.

use std::collections::HashMap;

use emberglen_domain::{Npc, NpcId, Position};

#[derive(Debug, Default)]
pub struct NpcRoster {
    npcs: HashMap<NpcId, Npc>,
    order: Vec<NpcId>,
}

impl NpcRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an NPC. Re-adding an id replaces the stored NPC in place.
    pub fn insert(&mut self, npc: Npc) {
        if !self.npcs.contains_key(&npc.id) {
            self.order.push(npc.id);
        }
        self.npcs.insert(npc.id, npc);
    }

    pub fn remove(&mut self, id: NpcId) -> Option<Npc> {
        self.order.retain(|existing| *existing != id);
        self.npcs.remove(&id)
    }

    pub fn get(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&Npc> {
        let wanted = name.trim();
        self.iter().find(|npc| npc.name.eq_ignore_ascii_case(wanted))
    }

    pub fn set_position(&mut self, id: NpcId, position: Position) -> bool {
        match self.npcs.get_mut(&id) {
            Some(npc) => {
                npc.position = position;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.order.iter().filter_map(|id| self.npcs.get(id))
    }

    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}
