//! Presentation surface port.
//!
//! The chat panels, the log and the quest banner live in whatever renders
//! the village (a browser DOM overlay, a terminal). The presenter only talks
//! to them through [`UiPort`].

use emberglen_domain::{DialogueRole, NpcId};

/// Text color for lines typed by the player
pub const PLAYER_COLOR: &str = "#3d1e01";
/// Text color for lines spoken by an NPC
pub const CHARACTER_COLOR: &str = "#8a0094";
/// Text color for local notices
pub const SYSTEM_COLOR: &str = "#b22222";

/// A rendered chat log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub role: DialogueRole,
    pub display_name: String,
    pub text: String,
    pub color: &'static str,
}

impl LogEntry {
    pub fn new(role: DialogueRole, display_name: impl Into<String>, text: impl Into<String>) -> Self {
        let color = match role {
            DialogueRole::Player => PLAYER_COLOR,
            DialogueRole::Character => CHARACTER_COLOR,
            DialogueRole::System => SYSTEM_COLOR,
        };
        Self {
            role,
            display_name: display_name.into(),
            text: text.into(),
            color,
        }
    }

    /// `"<DisplayName>: <text>"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.display_name, self.text)
    }
}

/// Pointer shape shown while hovering an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

#[cfg_attr(test, mockall::automock)]
pub trait UiPort: Send {
    /// Build the panel (log, input, send and close buttons) for an NPC.
    fn create_panel(&mut self, npc_id: NpcId, panel: &str);
    fn show_panel(&mut self, npc_id: NpcId);
    fn hide_panel(&mut self, npc_id: NpcId);
    fn focus_input(&mut self, npc_id: NpcId);
    /// Append a line to the NPC's log and scroll it into view.
    fn append_log(&mut self, npc_id: NpcId, entry: &LogEntry);
    fn set_quest_banner(&mut self, text: &str);
    fn set_cursor(&mut self, cursor: CursorStyle);
}
