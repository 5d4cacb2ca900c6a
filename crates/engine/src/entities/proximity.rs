//! Interaction range check between the player and an NPC.

use emberglen_domain::Position;

/// Default maximum distance (world units) for opening a chat
pub const DEFAULT_INTERACTION_RANGE: f32 = 230.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityGate {
    threshold: f32,
}

impl Default for ProximityGate {
    fn default() -> Self {
        Self::new(DEFAULT_INTERACTION_RANGE)
    }
}

impl ProximityGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True when the player is strictly closer than the threshold.
    ///
    /// Only consulted when the player tries to interact; an open chat is not
    /// closed by walking away.
    pub fn in_range(&self, player: &Position, npc: &Position) -> bool {
        player.distance_to(npc) < self.threshold
    }
}
