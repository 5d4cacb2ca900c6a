//! Application composition.

use std::sync::Arc;

use emberglen_domain::DialogueEvent;
use tokio::sync::mpsc;

use crate::api::ChatPresenter;
use crate::entities::ProximityGate;
use crate::infrastructure::{
    clock::SystemClock,
    ollama::OllamaClient,
    ports::{ClockPort, LlmPort, UiPort},
    resilient_llm::ResilientLlmClient,
    roster::{RosterError, VillageRoster},
    settings::EngineSettings,
};
use crate::use_cases::dialogue::DialogueSessionManager;
use crate::use_cases::village::Village;

/// Main application state.
///
/// Holds the populated village and the dialogue event stream until a
/// presentation surface takes them over.
pub struct App {
    pub village: Village,
    pub events: mpsc::UnboundedReceiver<DialogueEvent>,
}

impl App {
    /// Wire the village from settings with the given chat backend and clock.
    pub async fn new(
        settings: &EngineSettings,
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, RosterError> {
        let roster = match &settings.roster_path {
            Some(path) => VillageRoster::load(path)?,
            None => VillageRoster::builtin(),
        };

        let (dialogue, events) = DialogueSessionManager::new(llm, clock);
        let gate = ProximityGate::new(settings.interaction_range);
        let village = Village::from_roster(roster, gate, Arc::new(dialogue)).await;

        tracing::info!(
            npcs = village.npcs().len(),
            interaction_range = gate.threshold(),
            "Village ready"
        );
        Ok(Self { village, events })
    }

    /// Wire the village against the configured Ollama backend.
    pub async fn from_settings(settings: &EngineSettings) -> Result<Self, RosterError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        Self::new(settings, Self::llm_backend(settings), clock).await
    }

    /// Ollama client with retry on transient failures.
    pub fn llm_backend(settings: &EngineSettings) -> Arc<dyn LlmPort> {
        tracing::info!(
            url = %settings.ollama_base_url,
            model = %settings.ollama_model,
            timeout_secs = settings.llm_timeout_secs,
            "Using Ollama chat backend"
        );
        let ollama: Arc<dyn LlmPort> = Arc::new(OllamaClient::with_timeout(
            &settings.ollama_base_url,
            &settings.ollama_model,
            settings.llm_timeout_secs,
        ));
        Arc::new(ResilientLlmClient::new(ollama, settings.retry.clone()))
    }

    /// Hand the village to a presentation surface.
    pub fn into_presenter<U: UiPort>(self, ui: U) -> ChatPresenter<U> {
        ChatPresenter::new(ui, self.village, self.events)
    }
}
