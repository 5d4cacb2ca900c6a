//! Chat presenter.
//!
//! Sits between a presentation surface and the village. Inbound, it turns
//! [`UiEvent`]s into scene and dialogue calls; outbound, it renders every
//! [`DialogueEvent`] through the [`UiPort`].

use emberglen_domain::{DialogueEvent, NpcId, QuestEvent};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::infrastructure::ports::{CursorStyle, LogEntry, UiPort};
use crate::use_cases::dialogue::SubmitOutcome;
use crate::use_cases::movement::MovementInput;
use crate::use_cases::village::{InteractOutcome, Village};

pub const NO_QUEST_BANNER: &str = "Current Quest: None";

/// Input coming from the presentation surface
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The player clicked an NPC
    Interact(NpcId),
    /// Send button or Enter in an NPC's input box
    Submit { npc_id: NpcId, text: String },
    CloseClicked,
    /// Keys held during one frame
    MovementKey { input: MovementInput, dt: f32 },
    PointerOver(NpcId),
    PointerOut,
}

pub fn quest_banner(title: Option<&str>) -> String {
    match title {
        Some(title) => format!("Current Quest: {}", title),
        None => NO_QUEST_BANNER.to_string(),
    }
}

pub struct ChatPresenter<U: UiPort> {
    ui: U,
    village: Village,
    events: mpsc::UnboundedReceiver<DialogueEvent>,
    submits: JoinSet<SubmitOutcome>,
}

impl<U: UiPort> ChatPresenter<U> {
    pub fn new(mut ui: U, village: Village, events: mpsc::UnboundedReceiver<DialogueEvent>) -> Self {
        ui.set_quest_banner(NO_QUEST_BANNER);
        Self {
            ui,
            village,
            events,
            submits: JoinSet::new(),
        }
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn village(&self) -> &Village {
        &self.village
    }

    /// Apply one UI event, then render whatever it produced.
    pub async fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::Interact(npc_id) => {
                let outcome = self.village.interact(npc_id).await;
                if let InteractOutcome::OutOfRange { distance } = outcome {
                    tracing::debug!(npc_id = %npc_id, distance, "Interaction ignored");
                }
            }
            UiEvent::Submit { npc_id, text } => {
                let dialogue = std::sync::Arc::clone(self.village.dialogue());
                self.submits
                    .spawn(async move { dialogue.submit(npc_id, &text).await });
            }
            UiEvent::CloseClicked => {
                self.village.dialogue().close().await;
            }
            UiEvent::MovementKey { input, dt } => {
                self.village.tick(&input, dt).await;
            }
            UiEvent::PointerOver(npc_id) => {
                let cursor = self.village.cursor_for(npc_id);
                self.ui.set_cursor(cursor);
            }
            UiEvent::PointerOut => self.ui.set_cursor(CursorStyle::Default),
        }
        self.reap_submits();
        self.render_pending();
    }

    /// Wait for the next dialogue event and render it. Returns `false` once
    /// the manager is gone.
    pub async fn pump(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.render(event);
                true
            }
            None => false,
        }
    }

    /// Render every event already queued.
    pub fn render_pending(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.render(event);
        }
    }

    /// Wait for all spawned submits to finish and render their results.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.submits.join_next().await {
            Self::log_submit(joined);
        }
        self.render_pending();
    }

    pub fn pending_submits(&self) -> usize {
        self.submits.len()
    }

    fn reap_submits(&mut self) {
        while let Some(joined) = self.submits.try_join_next() {
            Self::log_submit(joined);
        }
    }

    fn log_submit(joined: Result<SubmitOutcome, tokio::task::JoinError>) {
        match joined {
            Ok(SubmitOutcome::Busy) => {
                tracing::info!("Submit rejected, previous reply still pending");
            }
            Ok(outcome) => tracing::debug!(?outcome, "Submit finished"),
            Err(e) => tracing::error!(error = %e, "Submit task failed"),
        }
    }

    fn render(&mut self, event: DialogueEvent) {
        match event {
            DialogueEvent::SessionOpened {
                npc_id,
                panel,
                first_open,
                ..
            } => {
                if first_open {
                    self.ui.create_panel(npc_id, &panel);
                }
                self.ui.show_panel(npc_id);
                self.ui.focus_input(npc_id);
            }
            DialogueEvent::SessionClosed { npc_id } => self.ui.hide_panel(npc_id),
            DialogueEvent::TurnAppended { npc_id, turn } => {
                let entry = LogEntry::new(turn.role, turn.speaker, turn.text);
                self.ui.append_log(npc_id, &entry);
            }
            DialogueEvent::Quest(QuestEvent::Started { title, .. }) => {
                self.ui.set_quest_banner(&quest_banner(Some(&title)));
            }
            DialogueEvent::Quest(QuestEvent::Completed { .. }) => {
                self.ui.set_quest_banner(&quest_banner(None));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ProximityGate;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        LlmError, LlmPort, LlmResponse, MockLlmPort, MockUiPort, CHARACTER_COLOR, PLAYER_COLOR,
        SYSTEM_COLOR,
    };
    use crate::infrastructure::roster::VillageRoster;
    use crate::use_cases::dialogue::DialogueSessionManager;
    use crate::use_cases::movement::Direction;
    use chrono::Utc;
    use emberglen_domain::{DialogueRole, Position};
    use mockall::predicate::eq;
    use std::sync::Arc;

    /// Surface that records every call in order.
    #[derive(Default)]
    struct RecordingUi {
        calls: Vec<String>,
        logs: Vec<LogEntry>,
    }

    impl UiPort for RecordingUi {
        fn create_panel(&mut self, _npc_id: NpcId, panel: &str) {
            self.calls.push(format!("create {panel}"));
        }
        fn show_panel(&mut self, _npc_id: NpcId) {
            self.calls.push("show".into());
        }
        fn hide_panel(&mut self, _npc_id: NpcId) {
            self.calls.push("hide".into());
        }
        fn focus_input(&mut self, _npc_id: NpcId) {
            self.calls.push("focus".into());
        }
        fn append_log(&mut self, _npc_id: NpcId, entry: &LogEntry) {
            self.calls.push(format!("log {}", entry.render()));
            self.logs.push(entry.clone());
        }
        fn set_quest_banner(&mut self, text: &str) {
            self.calls.push(format!("banner {text}"));
        }
        fn set_cursor(&mut self, cursor: CursorStyle) {
            self.calls.push(format!("cursor {cursor:?}"));
        }
    }

    async fn presenter_with<U: UiPort>(ui: U, llm: Arc<dyn LlmPort>) -> (ChatPresenter<U>, NpcId) {
        let (manager, events) = DialogueSessionManager::new(llm, Arc::new(FixedClock(Utc::now())));
        let mut roster = VillageRoster::builtin();
        roster.player_start = Position::new(600.0, 450.0);
        let village =
            Village::from_roster(roster, ProximityGate::default(), Arc::new(manager)).await;
        let elder = village
            .npcs()
            .find_by_name("Elder Sage")
            .map(|n| n.id)
            .expect("elder");
        (ChatPresenter::new(ui, village, events), elder)
    }

    fn no_backend() -> Arc<dyn LlmPort> {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        Arc::new(llm)
    }

    #[test]
    fn banner_text() {
        assert_eq!(quest_banner(Some("Gather Magical Herbs")), "Current Quest: Gather Magical Herbs");
        assert_eq!(quest_banner(None), "Current Quest: None");
    }

    #[tokio::test]
    async fn first_open_creates_panel_later_opens_reuse_it() {
        let (mut presenter, elder) = presenter_with(RecordingUi::default(), no_backend()).await;

        presenter.dispatch(UiEvent::Interact(elder)).await;
        presenter.dispatch(UiEvent::CloseClicked).await;
        presenter.dispatch(UiEvent::Interact(elder)).await;

        assert_eq!(
            presenter.ui().calls,
            vec![
                "banner Current Quest: None",
                "create chat-log-you-are-a-wise-elder-of-the-village-seeking-help-to-gather-magical-herbs.-you-speak-with-authority-and-wisdom.",
                "show",
                "focus",
                "hide",
                "show",
                "focus",
            ]
        );
    }

    #[tokio::test]
    async fn quest_trigger_updates_banner_and_log() {
        let (mut presenter, elder) = presenter_with(RecordingUi::default(), no_backend()).await;
        presenter.dispatch(UiEvent::Interact(elder)).await;

        presenter
            .dispatch(UiEvent::Submit {
                npc_id: elder,
                text: "Do you need help?".into(),
            })
            .await;
        presenter.settle().await;

        let calls = &presenter.ui().calls;
        assert!(calls.contains(&"banner Current Quest: Gather Magical Herbs".to_string()));
        let log = presenter.ui().logs.last().expect("log entry");
        assert_eq!(log.role, DialogueRole::Character);
        assert_eq!(log.color, CHARACTER_COLOR);
        assert_eq!(
            log.render(),
            "Elder Sage: New Quest: Gather Magical Herbs\nThe village needs magical herbs for healing potions."
        );
    }

    #[tokio::test]
    async fn reply_renders_player_then_npc_lines() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Ok(LlmResponse::text("Greetings, traveler.")));
        let (mut presenter, elder) = presenter_with(RecordingUi::default(), Arc::new(llm)).await;
        presenter.dispatch(UiEvent::Interact(elder)).await;

        presenter
            .dispatch(UiEvent::Submit {
                npc_id: elder,
                text: "hello".into(),
            })
            .await;
        presenter.settle().await;

        let logs = &presenter.ui().logs;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].render(), "Player: hello");
        assert_eq!(logs[0].color, PLAYER_COLOR);
        assert_eq!(logs[1].render(), "Elder Sage: Greetings, traveler.");
        assert_eq!(presenter.pending_submits(), 0);
    }

    #[tokio::test]
    async fn backend_failure_renders_system_line() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".into())));
        let (mut presenter, elder) = presenter_with(RecordingUi::default(), Arc::new(llm)).await;
        presenter.dispatch(UiEvent::Interact(elder)).await;

        presenter
            .dispatch(UiEvent::Submit {
                npc_id: elder,
                text: "hello".into(),
            })
            .await;
        presenter.settle().await;

        let last = presenter.ui().logs.last().expect("log entry");
        assert_eq!(last.color, SYSTEM_COLOR);
        assert_eq!(last.render(), "System: Elder Sage is unavailable right now.");
    }

    #[tokio::test]
    async fn movement_key_hides_open_panel() {
        let (mut presenter, elder) = presenter_with(RecordingUi::default(), no_backend()).await;
        presenter.dispatch(UiEvent::Interact(elder)).await;

        presenter
            .dispatch(UiEvent::MovementKey {
                input: MovementInput::pressed(Direction::Down),
                dt: 0.016,
            })
            .await;

        assert_eq!(presenter.ui().calls.last().map(String::as_str), Some("hide"));
        assert!(!presenter.village().dialogue().is_open().await);
        assert!(presenter.village().player().position().y > 450.0);
    }

    #[tokio::test]
    async fn pointer_events_set_cursor() {
        let mut ui = MockUiPort::new();
        ui.expect_set_quest_banner()
            .with(eq(NO_QUEST_BANNER))
            .times(1)
            .return_const(());
        let mut seq = mockall::Sequence::new();
        ui.expect_set_cursor()
            .with(eq(CursorStyle::Pointer))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        ui.expect_set_cursor()
            .with(eq(CursorStyle::Default))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let (mut presenter, elder) = presenter_with(ui, no_backend()).await;
        presenter.dispatch(UiEvent::PointerOver(elder)).await;
        presenter.dispatch(UiEvent::PointerOut).await;
    }

    #[tokio::test]
    async fn out_of_range_click_renders_nothing() {
        let mut ui = MockUiPort::new();
        ui.expect_set_quest_banner().return_const(());
        ui.expect_create_panel().never();
        ui.expect_show_panel().never();

        let (mut presenter, _) = presenter_with(ui, no_backend()).await;
        let merchant = presenter
            .village()
            .npcs()
            .find_by_name("Merchant Mystique")
            .map(|n| n.id)
            .expect("merchant");

        presenter.dispatch(UiEvent::Interact(merchant)).await;
    }
}
