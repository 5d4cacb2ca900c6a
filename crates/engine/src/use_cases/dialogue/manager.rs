//! Dialogue session manager.
//!
//! Owns every NPC's session, the single "open" slot and the quest registry.
//! All state sits behind one async mutex that is released while a backend
//! reply is awaited, so closing the panel or talking to the frame loop stays
//! responsive during a slow reply.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use emberglen_domain::{
    DialogueEvent, DialogueRole, DialogueTurn, Npc, NpcId, Quest, QuestId, QuestStatus,
};
use tokio::sync::{mpsc, Mutex};

use super::session::DialogueSession;
use crate::entities::{CharacterChat, QuestRegistry, Trigger, TriggerDetector};
use crate::infrastructure::ports::{ClockPort, LlmPort, MessageRole};

/// Display name used for the player's own lines
pub const PLAYER_DISPLAY_NAME: &str = "Player";
/// Display name used for local notices
pub const SYSTEM_DISPLAY_NAME: &str = "System";
/// Notice shown when a quest keyword is used while another quest is active
pub const QUEST_BLOCKED_NOTICE: &str = "Finish your current quest first.";

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { first_open: bool },
    /// Some session (this NPC's or another's) is already open
    AlreadyOpen,
    UnknownNpc,
}

/// Result of a submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input
    Ignored,
    /// The NPC's session is not the open one
    NotOpen,
    /// A previous submit for this session is still waiting on the backend
    Busy,
    /// Input started a quest and was not sent to the backend
    QuestTriggered(QuestId),
    /// Input asked for a quest while another was active; it was not sent to
    /// the backend and a notice was appended
    QuestBlocked(QuestId),
    Replied,
    /// The backend failed; a notice was appended instead of a reply
    BackendFailed,
}

/// Static facts about an NPC the manager needs to run its session
#[derive(Debug, Clone)]
struct NpcProfile {
    name: String,
    character_description: String,
    quest: Option<QuestId>,
    panel: String,
}

impl From<&Npc> for NpcProfile {
    fn from(npc: &Npc) -> Self {
        Self {
            name: npc.name.clone(),
            character_description: npc.character_description.clone(),
            quest: npc.quest.clone(),
            panel: npc.panel_slug(),
        }
    }
}

#[derive(Default)]
struct DialogueState {
    profiles: HashMap<NpcId, NpcProfile>,
    sessions: HashMap<NpcId, DialogueSession>,
    open: Option<NpcId>,
    quests: QuestRegistry,
    spoken_to: HashSet<NpcId>,
}

pub struct DialogueSessionManager {
    state: Mutex<DialogueState>,
    llm: Arc<dyn LlmPort>,
    clock: Arc<dyn ClockPort>,
    detector: TriggerDetector,
    events: mpsc::UnboundedSender<DialogueEvent>,
}

impl DialogueSessionManager {
    /// Create a manager and the receiving end of its event stream.
    pub fn new(
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
    ) -> (Self, mpsc::UnboundedReceiver<DialogueEvent>) {
        Self::with_detector(llm, clock, TriggerDetector::default())
    }

    pub fn with_detector(
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
        detector: TriggerDetector,
    ) -> (Self, mpsc::UnboundedReceiver<DialogueEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let manager = Self {
            state: Mutex::new(DialogueState::default()),
            llm,
            clock,
            detector,
            events,
        };
        (manager, receiver)
    }

    // =========================================================================
    // Setup
    // =========================================================================

    pub async fn register_quest(&self, quest: Quest) {
        self.state.lock().await.quests.register(quest);
    }

    /// Make an NPC available for dialogue. Re-registering updates its profile
    /// but keeps an existing session.
    pub async fn register_npc(&self, npc: &Npc) {
        let mut state = self.state.lock().await;
        state.profiles.insert(npc.id, NpcProfile::from(npc));
        tracing::debug!(npc_id = %npc.id, name = %npc.name, "NPC registered for dialogue");
    }

    /// Forget an NPC and its session. Closes it first if it was open.
    pub async fn remove_npc(&self, npc_id: NpcId) -> bool {
        let mut state = self.state.lock().await;
        if state.open == Some(npc_id) {
            self.close_locked(&mut state);
        }
        state.sessions.remove(&npc_id);
        state.spoken_to.remove(&npc_id);
        state.profiles.remove(&npc_id).is_some()
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    pub async fn open(&self, npc_id: NpcId) -> OpenOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if let Some(open) = state.open {
            tracing::debug!(npc_id = %npc_id, open_npc = %open, "Chat already open, ignoring");
            return OpenOutcome::AlreadyOpen;
        }
        let Some(profile) = state.profiles.get(&npc_id) else {
            tracing::debug!(npc_id = %npc_id, "Open requested for unknown NPC");
            return OpenOutcome::UnknownNpc;
        };

        let first_open = !state.sessions.contains_key(&npc_id);
        let session = state.sessions.entry(npc_id).or_insert_with(|| {
            DialogueSession::new(
                npc_id,
                CharacterChat::new(profile.character_description.clone(), Arc::clone(&self.llm)),
            )
        });
        session.set_open(true);
        state.open = Some(npc_id);
        state.spoken_to.insert(npc_id);

        tracing::info!(npc_id = %npc_id, name = %profile.name, first_open, "Chat opened");
        self.emit(DialogueEvent::SessionOpened {
            npc_id,
            npc_name: profile.name.clone(),
            panel: profile.panel.clone(),
            first_open,
        });
        OpenOutcome::Opened { first_open }
    }

    /// Hide the open session. History is kept.
    pub async fn close(&self) -> Option<NpcId> {
        let mut state = self.state.lock().await;
        self.close_locked(&mut state)
    }

    fn close_locked(&self, state: &mut DialogueState) -> Option<NpcId> {
        let npc_id = state.open.take()?;
        if let Some(session) = state.sessions.get_mut(&npc_id) {
            session.set_open(false);
        }
        tracing::info!(npc_id = %npc_id, "Chat closed");
        self.emit(DialogueEvent::SessionClosed { npc_id });
        Some(npc_id)
    }

    // =========================================================================
    // Submitting player input
    // =========================================================================

    /// Handle a line typed into an NPC's chat.
    ///
    /// Quest keywords are checked first. When the NPC's quest is inactive the
    /// input is consumed without reaching the backend: the quest starts, or a
    /// notice is shown if another quest is already active. Otherwise the
    /// player line is recorded, the backend is asked for a reply with the full
    /// context, and the reply (or an unavailable notice) is recorded.
    pub async fn submit(&self, npc_id: NpcId, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let (llm, request, npc_name) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            if state.open != Some(npc_id) {
                tracing::debug!(npc_id = %npc_id, "Submit for a session that is not open");
                return SubmitOutcome::NotOpen;
            }
            let (Some(profile), Some(session)) =
                (state.profiles.get(&npc_id), state.sessions.get_mut(&npc_id))
            else {
                return SubmitOutcome::NotOpen;
            };
            if session.is_in_flight() {
                tracing::debug!(npc_id = %npc_id, "Reply still pending, rejecting submit");
                return SubmitOutcome::Busy;
            }

            match self
                .detector
                .detect(text, profile.quest.as_ref(), &mut state.quests)
            {
                Some(Trigger::Started(event)) => {
                    let quest_id = event.quest_id().clone();
                    let announcement = state
                        .quests
                        .get(&quest_id)
                        .map(Quest::announcement)
                        .unwrap_or_default();
                    self.emit(DialogueEvent::Quest(event));
                    let turn = DialogueTurn::new(
                        DialogueRole::Character,
                        profile.name.clone(),
                        announcement,
                        self.clock.now(),
                    );
                    self.append(session, turn);
                    return SubmitOutcome::QuestTriggered(quest_id);
                }
                Some(Trigger::Blocked(quest_id)) => {
                    tracing::debug!(
                        npc_id = %npc_id,
                        quest_id = %quest_id,
                        "Quest keyword while another quest is active"
                    );
                    let turn = DialogueTurn::new(
                        DialogueRole::System,
                        SYSTEM_DISPLAY_NAME,
                        QUEST_BLOCKED_NOTICE,
                        self.clock.now(),
                    );
                    self.append(session, turn);
                    return SubmitOutcome::QuestBlocked(quest_id);
                }
                None => {}
            }

            let turn = DialogueTurn::new(
                DialogueRole::Player,
                PLAYER_DISPLAY_NAME,
                text,
                self.clock.now(),
            );
            self.append(session, turn);
            session.chat_mut().add_message(MessageRole::User, text);
            session.set_in_flight(true);

            (session.chat().backend(), session.chat().request(), profile.name.clone())
        };

        let result = CharacterChat::resolve(llm, request).await;

        let mut state = self.state.lock().await;
        let Some(session) = state.sessions.get_mut(&npc_id) else {
            tracing::debug!(npc_id = %npc_id, "NPC removed while its reply was pending, dropping reply");
            return SubmitOutcome::NotOpen;
        };
        session.set_in_flight(false);

        match result {
            Ok(reply) => {
                session
                    .chat_mut()
                    .add_message(MessageRole::Assistant, reply.clone());
                let turn =
                    DialogueTurn::new(DialogueRole::Character, npc_name, reply, self.clock.now());
                self.append(session, turn);
                SubmitOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(npc_id = %npc_id, error = %e, "Chat backend failed");
                session.chat_mut().retract_unanswered();
                let turn = DialogueTurn::new(
                    DialogueRole::System,
                    SYSTEM_DISPLAY_NAME,
                    format!("{} is unavailable right now.", npc_name),
                    self.clock.now(),
                );
                self.append(session, turn);
                SubmitOutcome::BackendFailed
            }
        }
    }

    // =========================================================================
    // Quests
    // =========================================================================

    /// Finish the active quest. Silently ignored for any other quest.
    pub async fn complete_quest(&self, quest_id: &QuestId) -> bool {
        let mut state = self.state.lock().await;
        match state.quests.complete(quest_id) {
            Some(event) => {
                self.emit(DialogueEvent::Quest(event));
                true
            }
            None => false,
        }
    }

    pub async fn quest_status(&self, quest_id: &QuestId) -> Option<QuestStatus> {
        self.state.lock().await.quests.status(quest_id)
    }

    pub async fn current_quest(&self) -> Option<Quest> {
        self.state.lock().await.quests.current().cloned()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.open.is_some()
    }

    pub async fn open_npc(&self) -> Option<NpcId> {
        self.state.lock().await.open
    }

    pub async fn history(&self, npc_id: NpcId) -> Vec<DialogueTurn> {
        self.state
            .lock()
            .await
            .sessions
            .get(&npc_id)
            .map(|s| s.history().to_vec())
            .unwrap_or_default()
    }

    pub async fn is_in_flight(&self, npc_id: NpcId) -> bool {
        self.state
            .lock()
            .await
            .sessions
            .get(&npc_id)
            .is_some_and(DialogueSession::is_in_flight)
    }

    pub async fn has_spoken_to(&self, npc_id: NpcId) -> bool {
        self.state.lock().await.spoken_to.contains(&npc_id)
    }

    /// Number of NPC sessions currently marked open (0 or 1)
    pub async fn open_session_count(&self) -> usize {
        self.state
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| s.is_open())
            .count()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn append(&self, session: &mut DialogueSession, turn: DialogueTurn) {
        let npc_id = session.npc_id();
        session.push(turn.clone());
        self.emit(DialogueEvent::TurnAppended { npc_id, turn });
    }

    fn emit(&self, event: DialogueEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No presenter listening for dialogue events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        LlmError, LlmRequest, LlmResponse, MockClockPort, MockLlmPort,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use emberglen_domain::{Position, QuestEvent};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::{oneshot, Notify};

    struct Fixture {
        manager: Arc<DialogueSessionManager>,
        events: mpsc::UnboundedReceiver<DialogueEvent>,
        elder: Npc,
        merchant: Npc,
    }

    fn elder() -> Npc {
        Npc::new(
            "Elder Sage",
            "You are a wise elder of the village.",
            Position::new(600.0, 500.0),
        )
        .expect("npc")
        .with_quest(QuestId::new("gather_herbs").expect("slug"))
    }

    fn merchant() -> Npc {
        Npc::new(
            "Merchant Mystique",
            "You are a mysterious merchant.",
            Position::new(800.0, 650.0),
        )
        .expect("npc")
        .with_quest(QuestId::new("find_artifact").expect("slug"))
    }

    fn herbs() -> Quest {
        Quest::new(
            QuestId::new("gather_herbs").expect("slug"),
            "Gather Magical Herbs",
            "The village needs magical herbs for healing potions.",
        )
        .expect("quest")
    }

    fn artifact() -> Quest {
        Quest::new(
            QuestId::new("find_artifact").expect("slug"),
            "Search for Lost Artifact",
            "A powerful artifact has been lost in the forest.",
        )
        .expect("quest")
    }

    async fn fixture(llm: Arc<dyn LlmPort>) -> Fixture {
        let (manager, events) =
            DialogueSessionManager::new(llm, Arc::new(FixedClock(Utc::now())));
        let (elder, merchant) = (elder(), merchant());
        manager.register_quest(herbs()).await;
        manager.register_quest(artifact()).await;
        manager.register_npc(&elder).await;
        manager.register_npc(&merchant).await;
        Fixture {
            manager: Arc::new(manager),
            events,
            elder,
            merchant,
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<DialogueEvent>) -> Vec<DialogueEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn replying(reply: &'static str, times: usize) -> Arc<dyn LlmPort> {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(times)
            .returning(move |_| Ok(LlmResponse::text(reply)));
        Arc::new(llm)
    }

    fn never_called() -> Arc<dyn LlmPort> {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        Arc::new(llm)
    }

    /// Backend whose reply is released by the test.
    struct GatedLlm {
        started: Notify,
        reply: StdMutex<Option<oneshot::Receiver<Result<String, LlmError>>>>,
        requests: StdMutex<Vec<LlmRequest>>,
    }

    impl GatedLlm {
        fn new() -> (Arc<Self>, oneshot::Sender<Result<String, LlmError>>) {
            let (tx, rx) = oneshot::channel();
            let llm = Arc::new(Self {
                started: Notify::new(),
                reply: StdMutex::new(Some(rx)),
                requests: StdMutex::new(Vec::new()),
            });
            (llm, tx)
        }
    }

    #[async_trait]
    impl LlmPort for GatedLlm {
        async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().expect("lock").push(request);
            let rx = self.reply.lock().expect("lock").take();
            self.started.notify_one();
            let Some(rx) = rx else {
                return Err(LlmError::RequestFailed("gate already used".into()));
            };
            match rx.await {
                Ok(result) => result.map(LlmResponse::text),
                Err(_) => Err(LlmError::RequestFailed("gate dropped".into())),
            }
        }
    }

    #[tokio::test]
    async fn only_one_session_can_be_open() {
        let f = fixture(never_called()).await;

        assert_eq!(
            f.manager.open(f.elder.id).await,
            OpenOutcome::Opened { first_open: true }
        );
        assert_eq!(f.manager.open(f.merchant.id).await, OpenOutcome::AlreadyOpen);
        assert_eq!(f.manager.open(f.elder.id).await, OpenOutcome::AlreadyOpen);

        assert_eq!(f.manager.open_npc().await, Some(f.elder.id));
        assert_eq!(f.manager.open_session_count().await, 1);
    }

    #[tokio::test]
    async fn close_is_a_no_op_when_nothing_is_open() {
        let mut f = fixture(never_called()).await;
        assert_eq!(f.manager.close().await, None);
        assert!(drain(&mut f.events).is_empty());
    }

    #[tokio::test]
    async fn open_unknown_npc_is_rejected() {
        let f = fixture(never_called()).await;
        assert_eq!(f.manager.open(NpcId::new()).await, OpenOutcome::UnknownNpc);
        assert!(!f.manager.is_open().await);
    }

    #[tokio::test]
    async fn quest_keyword_starts_quest_without_backend() {
        let mut f = fixture(never_called()).await;
        f.manager.open(f.elder.id).await;
        drain(&mut f.events);

        let outcome = f.manager.submit(f.elder.id, "Do you have a quest?").await;

        let herbs_id = QuestId::new("gather_herbs").expect("slug");
        assert_eq!(outcome, SubmitOutcome::QuestTriggered(herbs_id.clone()));
        assert_eq!(f.manager.quest_status(&herbs_id).await, Some(QuestStatus::Active));

        let history = f.manager.history(f.elder.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, DialogueRole::Character);
        assert_eq!(history[0].speaker, "Elder Sage");
        assert_eq!(
            history[0].text,
            "New Quest: Gather Magical Herbs\nThe village needs magical herbs for healing potions."
        );

        let events = drain(&mut f.events);
        assert!(matches!(events[0], DialogueEvent::Quest(QuestEvent::Started { .. })));
        assert!(matches!(events[1], DialogueEvent::TurnAppended { .. }));
    }

    #[tokio::test]
    async fn plain_message_goes_to_backend_once_and_records_both_lines() {
        let f = fixture(replying("Greetings, young one.", 1)).await;
        f.manager.open(f.elder.id).await;

        let outcome = f.manager.submit(f.elder.id, "hello").await;

        assert_eq!(outcome, SubmitOutcome::Replied);
        let history = f.manager.history(f.elder.id).await;
        let lines: Vec<(DialogueRole, &str, &str)> = history
            .iter()
            .map(|t| (t.role, t.speaker.as_str(), t.text.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                (DialogueRole::Player, "Player", "hello"),
                (DialogueRole::Character, "Elder Sage", "Greetings, young one."),
            ]
        );
    }

    #[tokio::test]
    async fn keyword_after_quest_started_is_forwarded() {
        let f = fixture(replying("The herbs grow by the river.", 1)).await;
        f.manager.open(f.elder.id).await;
        f.manager.submit(f.elder.id, "quest").await;

        let outcome = f.manager.submit(f.elder.id, "Can you help me find them?").await;

        assert_eq!(outcome, SubmitOutcome::Replied);
        assert_eq!(f.manager.history(f.elder.id).await.len(), 3);
    }

    #[tokio::test]
    async fn keyword_while_another_quest_is_active_skips_backend() {
        let f = fixture(never_called()).await;
        f.manager.open(f.elder.id).await;
        f.manager.submit(f.elder.id, "task").await;
        f.manager.close().await;

        f.manager.open(f.merchant.id).await;
        let outcome = f.manager.submit(f.merchant.id, "any quest for me?").await;

        let artifact_id = QuestId::new("find_artifact").expect("slug");
        assert_eq!(outcome, SubmitOutcome::QuestBlocked(artifact_id.clone()));
        assert_eq!(
            f.manager.quest_status(&artifact_id).await,
            Some(QuestStatus::Inactive)
        );
        assert_eq!(
            f.manager.current_quest().await.map(|q| q.id.to_string()),
            Some("gather_herbs".to_string())
        );
        let history = f.manager.history(f.merchant.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, DialogueRole::System);
        assert_eq!(history[0].text, QUEST_BLOCKED_NOTICE);
    }

    #[tokio::test]
    async fn blank_submit_is_ignored() {
        let f = fixture(never_called()).await;
        f.manager.open(f.elder.id).await;

        assert_eq!(f.manager.submit(f.elder.id, "   ").await, SubmitOutcome::Ignored);
        assert!(f.manager.history(f.elder.id).await.is_empty());
    }

    #[tokio::test]
    async fn submit_to_closed_session_is_rejected() {
        let f = fixture(never_called()).await;
        assert_eq!(f.manager.submit(f.elder.id, "hello").await, SubmitOutcome::NotOpen);

        f.manager.open(f.merchant.id).await;
        assert_eq!(f.manager.submit(f.elder.id, "hello").await, SubmitOutcome::NotOpen);
    }

    #[tokio::test]
    async fn reopening_preserves_history() {
        let f = fixture(replying("Welcome back.", 1)).await;
        f.manager.open(f.elder.id).await;
        f.manager.submit(f.elder.id, "hello").await;
        f.manager.close().await;

        assert_eq!(
            f.manager.open(f.elder.id).await,
            OpenOutcome::Opened { first_open: false }
        );
        let history = f.manager.history(f.elder.id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text, "Welcome back.");
    }

    #[tokio::test]
    async fn backend_context_accumulates_across_turns() {
        let mut llm = MockLlmPort::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.messages.len() == 1)
            .returning(|_| Ok(LlmResponse::text("First.")));
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                req.messages.len() == 3
                    && req.messages[1].content == "First."
                    && req.system_prompt.as_deref() == Some("You are a wise elder of the village.")
            })
            .returning(|_| Ok(LlmResponse::text("Second.")));

        let f = fixture(Arc::new(llm)).await;
        f.manager.open(f.elder.id).await;
        assert_eq!(f.manager.submit(f.elder.id, "one").await, SubmitOutcome::Replied);
        assert_eq!(f.manager.submit(f.elder.id, "two").await, SubmitOutcome::Replied);
    }

    #[tokio::test]
    async fn backend_failure_renders_unavailable_notice() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::Timeout(120)));
        let f = fixture(Arc::new(llm)).await;
        f.manager.open(f.elder.id).await;

        let outcome = f.manager.submit(f.elder.id, "hello").await;

        assert_eq!(outcome, SubmitOutcome::BackendFailed);
        let history = f.manager.history(f.elder.id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, DialogueRole::System);
        assert_eq!(history[1].text, "Elder Sage is unavailable right now.");
        assert!(!f.manager.is_in_flight(f.elder.id).await);
    }

    #[tokio::test]
    async fn failed_turn_is_left_out_of_the_next_request() {
        let mut llm = MockLlmPort::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(LlmError::RequestFailed("down".into())));
        llm.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.messages.len() == 1 && req.messages[0].content == "retry")
            .returning(|_| Ok(LlmResponse::text("I am here.")));

        let f = fixture(Arc::new(llm)).await;
        f.manager.open(f.elder.id).await;
        f.manager.submit(f.elder.id, "hello").await;
        assert_eq!(f.manager.submit(f.elder.id, "retry").await, SubmitOutcome::Replied);
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let (gate, release) = GatedLlm::new();
        let f = fixture(gate.clone()).await;
        f.manager.open(f.elder.id).await;

        let manager = Arc::clone(&f.manager);
        let npc_id = f.elder.id;
        let first = tokio::spawn(async move { manager.submit(npc_id, "hello").await });
        gate.started.notified().await;

        assert!(f.manager.is_in_flight(f.elder.id).await);
        assert_eq!(f.manager.submit(f.elder.id, "are you there?").await, SubmitOutcome::Busy);

        release.send(Ok("Patience.".to_string())).expect("send");
        assert_eq!(first.await.expect("join"), SubmitOutcome::Replied);

        let texts: Vec<String> = f
            .manager
            .history(f.elder.id)
            .await
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["hello", "Patience."]);
        assert_eq!(gate.requests.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn close_stays_responsive_and_late_reply_is_kept() {
        let (gate, release) = GatedLlm::new();
        let mut f = fixture(gate.clone()).await;
        f.manager.open(f.elder.id).await;

        let manager = Arc::clone(&f.manager);
        let npc_id = f.elder.id;
        let pending = tokio::spawn(async move { manager.submit(npc_id, "hello").await });
        gate.started.notified().await;

        assert_eq!(f.manager.close().await, Some(f.elder.id));
        assert!(!f.manager.is_open().await);

        release.send(Ok("You left so soon.".to_string())).expect("send");
        assert_eq!(pending.await.expect("join"), SubmitOutcome::Replied);

        f.manager.open(f.elder.id).await;
        let history = f.manager.history(f.elder.id).await;
        assert_eq!(history.last().map(|t| t.text.as_str()), Some("You left so soon."));

        let events = drain(&mut f.events);
        let closed = events
            .iter()
            .position(|e| matches!(e, DialogueEvent::SessionClosed { .. }));
        let reply = events.iter().position(|e| {
            matches!(e, DialogueEvent::TurnAppended { turn, .. } if turn.text == "You left so soon.")
        });
        assert!(closed < reply);
    }

    #[tokio::test]
    async fn complete_quest_only_finishes_active_quest() {
        let mut f = fixture(never_called()).await;
        let herbs_id = QuestId::new("gather_herbs").expect("slug");

        assert!(!f.manager.complete_quest(&herbs_id).await);

        f.manager.open(f.elder.id).await;
        f.manager.submit(f.elder.id, "help").await;
        drain(&mut f.events);

        assert!(f.manager.complete_quest(&herbs_id).await);
        assert_eq!(f.manager.quest_status(&herbs_id).await, Some(QuestStatus::Completed));
        assert!(f.manager.current_quest().await.is_none());
        assert!(matches!(
            drain(&mut f.events).as_slice(),
            [DialogueEvent::Quest(QuestEvent::Completed { .. })]
        ));
    }

    #[tokio::test]
    async fn turns_are_stamped_by_the_clock() {
        let at = Utc::now();
        let mut clock = MockClockPort::new();
        clock.expect_now().return_const(at);
        let (manager, _events) =
            DialogueSessionManager::new(replying("Hm.", 1), Arc::new(clock));
        let npc = elder();
        manager.register_npc(&npc).await;
        manager.open(npc.id).await;

        manager.submit(npc.id, "hello").await;

        assert!(manager.history(npc.id).await.iter().all(|t| t.at == at));
    }

    #[tokio::test]
    async fn opening_marks_npc_as_spoken_to() {
        let f = fixture(never_called()).await;
        assert!(!f.manager.has_spoken_to(f.elder.id).await);
        f.manager.open(f.elder.id).await;
        assert!(f.manager.has_spoken_to(f.elder.id).await);
        assert!(!f.manager.has_spoken_to(f.merchant.id).await);
    }

    #[tokio::test]
    async fn removing_open_npc_closes_its_session() {
        let mut f = fixture(never_called()).await;
        f.manager.open(f.elder.id).await;
        drain(&mut f.events);

        assert!(f.manager.remove_npc(f.elder.id).await);

        assert!(!f.manager.is_open().await);
        assert!(matches!(
            drain(&mut f.events).as_slice(),
            [DialogueEvent::SessionClosed { .. }]
        ));
        assert_eq!(f.manager.open(f.elder.id).await, OpenOutcome::UnknownNpc);
    }
}
