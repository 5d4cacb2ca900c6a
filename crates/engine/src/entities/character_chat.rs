//! Per-NPC binding to the chat backend.
//!
//! Holds the NPC's personality prompt and the running backend context (the
//! player/character exchange, without local notices or quest announcements).

use std::sync::Arc;

use crate::infrastructure::ports::{ChatMessage, LlmError, LlmPort, LlmRequest, MessageRole};

pub struct CharacterChat {
    persona: String,
    messages: Vec<ChatMessage>,
    llm: Arc<dyn LlmPort>,
}

impl CharacterChat {
    pub fn new(persona: impl Into<String>, llm: Arc<dyn LlmPort>) -> Self {
        Self {
            persona: persona.into(),
            messages: Vec::new(),
            llm,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record a turn in the backend context.
    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// Drop the trailing player turn after the backend failed to answer it.
    pub fn retract_unanswered(&mut self) -> Option<ChatMessage> {
        match self.messages.last() {
            Some(last) if last.role == MessageRole::User => self.messages.pop(),
            _ => None,
        }
    }

    /// Snapshot of the full running context, ready to send.
    pub fn request(&self) -> LlmRequest {
        LlmRequest::new(self.messages.clone()).with_system_prompt(self.persona.clone())
    }

    pub fn backend(&self) -> Arc<dyn LlmPort> {
        Arc::clone(&self.llm)
    }

    /// Ask the backend for the character's reply to a context snapshot.
    pub async fn resolve(llm: Arc<dyn LlmPort>, request: LlmRequest) -> Result<String, LlmError> {
        let response = llm.generate(request).await?;
        Ok(response.content)
    }

    /// Reply to the current context without recording it.
    pub async fn get_character_response(&self) -> Result<String, LlmError> {
        Self::resolve(self.backend(), self.request()).await
    }
}
