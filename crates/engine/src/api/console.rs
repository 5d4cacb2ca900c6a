//! Terminal presentation surface.
//!
//! Renders chat panels as plain lines on any writer and parses one command
//! per input line.

use std::collections::HashMap;
use std::io::Write;

use emberglen_domain::NpcId;

use crate::entities::NpcRoster;
use crate::infrastructure::ports::{CursorStyle, LogEntry, UiPort};
use crate::use_cases::movement::{Direction, MovementInput};

use super::presenter::UiEvent;

/// Seconds of movement applied by one `move` command
pub const MOVE_STEP_SECS: f32 = 0.25;

pub const HELP: &str = "\
Commands:
  talk <name>         open a chat with a nearby NPC
  close               close the open chat
  move <dir> [secs]   walk up/down/left/right (closes an open chat)
  hover <name>        check whether an NPC is within reach
  where               show your position and the NPCs
  quit                leave the village
Anything else is said to the NPC you are talking to.";

/// One parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Ui(UiEvent),
    /// Free text for whichever chat is open
    Say(String),
    Where,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str, npcs: &NpcRoster) -> ConsoleCommand {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "quit" | "exit" if rest.is_empty() => ConsoleCommand::Quit,
        "help" if rest.is_empty() => ConsoleCommand::Help,
        "where" if rest.is_empty() => ConsoleCommand::Where,
        "close" if rest.is_empty() => ConsoleCommand::Ui(UiEvent::CloseClicked),
        "talk" | "hover" => match npcs.find_by_name(rest) {
            Some(npc) if head.eq_ignore_ascii_case("talk") => {
                ConsoleCommand::Ui(UiEvent::Interact(npc.id))
            }
            Some(npc) => ConsoleCommand::Ui(UiEvent::PointerOver(npc.id)),
            None => ConsoleCommand::Invalid(format!("Nobody called '{rest}' lives here.")),
        },
        "move" => parse_move(rest),
        _ => ConsoleCommand::Say(line.to_string()),
    }
}

fn parse_move(args: &str) -> ConsoleCommand {
    let mut parts = args.split_whitespace();
    let Some(direction) = parts.next() else {
        return ConsoleCommand::Invalid("Move where?".to_string());
    };
    let direction: Direction = match direction.parse() {
        Ok(direction) => direction,
        Err(e) => return ConsoleCommand::Invalid(e.to_string()),
    };
    let dt = match parts.next().map(str::parse::<f32>) {
        None => MOVE_STEP_SECS,
        Some(Ok(secs)) if secs.is_finite() && secs > 0.0 => secs,
        Some(_) => return ConsoleCommand::Invalid("Duration must be a positive number".to_string()),
    };
    ConsoleCommand::Ui(UiEvent::MovementKey {
        input: MovementInput::pressed(direction),
        dt,
    })
}

/// Writes panels and log lines to a terminal
pub struct ConsoleUi<W: Write + Send> {
    out: W,
    panels: HashMap<NpcId, String>,
    cursor: CursorStyle,
}

impl<W: Write + Send> ConsoleUi<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            panels: HashMap::new(),
            cursor: CursorStyle::Default,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write to console");
        }
    }
}

impl<W: Write + Send> UiPort for ConsoleUi<W> {
    fn create_panel(&mut self, npc_id: NpcId, panel: &str) {
        tracing::debug!(npc_id = %npc_id, panel, "Chat panel created");
        self.panels.insert(npc_id, panel.to_string());
    }

    fn show_panel(&mut self, npc_id: NpcId) {
        let panel = self.panels.get(&npc_id).cloned().unwrap_or_default();
        self.line(&format!("--- [{panel}] ---"));
    }

    fn hide_panel(&mut self, _npc_id: NpcId) {
        self.line("--- chat closed ---");
    }

    fn focus_input(&mut self, _npc_id: NpcId) {}

    fn append_log(&mut self, _npc_id: NpcId, entry: &LogEntry) {
        let rendered = entry.render();
        self.line(&rendered);
    }

    fn set_quest_banner(&mut self, text: &str) {
        self.line(&format!("*** {text} ***"));
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        if cursor != self.cursor {
            match cursor {
                CursorStyle::Pointer => self.line("(within reach)"),
                CursorStyle::Default => self.line("(out of reach)"),
            }
        }
        self.cursor = cursor;
    }
}
