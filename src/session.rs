use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::gateway::{GenerationResult, ModelGateway};
use crate::prompt::{find_tool, FieldSpec, PromptError, PromptFields, ToolTemplate};
use crate::reveal::Reveal;
use crate::runner::{Completion, PendingRequest, Ticket, ToolRunner};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No tool selected. Use /tools to list them and /use <tool-id> to pick one.")]
    NoTool,

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Shared bot state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<ModelGateway>,
    sessions: Mutex<HashMap<ChatId, Arc<Mutex<Session>>>>,
}

impl AppState {
    pub fn new(config: Config, gateway: ModelGateway) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Session of one chat, created on first use.
    pub async fn session(&self, chat_id: ChatId) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(chat_id)
            .or_insert_with(|| {
                log::info!("New session for chat {}", chat_id);
                Arc::new(Mutex::new(Session::default()))
            })
            .clone()
    }
}

/// Per-chat state: the active tool, its fields and the running reveal.
#[derive(Default)]
pub struct Session {
    runner: Option<ToolRunner>,
    fields: PromptFields,
    reveal: Option<Reveal>,
}

impl Session {
    pub fn runner(&self) -> Option<&ToolRunner> {
        self.runner.as_ref()
    }

    pub fn fields(&self) -> &PromptFields {
        &self.fields
    }

    fn active(&mut self) -> Result<&mut ToolRunner, SessionError> {
        self.runner.as_mut().ok_or(SessionError::NoTool)
    }

    /// Switch tools. The previous runner is torn down together with its result.
    pub fn select(&mut self, id: &str) -> Result<&'static ToolTemplate, SessionError> {
        let template = find_tool(id).ok_or_else(|| PromptError::UnknownTool(id.trim().to_string()))?;
        self.stop_reveal();
        self.fields.clear();
        self.runner = Some(ToolRunner::new(template));
        log::info!("Session: tool {} selected", template.id());
        Ok(template)
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<&'static FieldSpec, SessionError> {
        let template = self.active()?.template();
        template.assign(&mut self.fields, name, value)?;
        template.field(name).ok_or_else(|| {
            SessionError::Prompt(PromptError::UnknownField {
                tool: template.id().to_string(),
                field: name.to_string(),
            })
        })
    }

    pub fn set_primary(&mut self, value: &str) -> Result<&'static FieldSpec, SessionError> {
        let name = self.active()?.template().primary_field().name;
        self.set_field(name, value)
    }

    /// Start a request for the active tool. `None` when the primary field is empty.
    pub fn begin(&mut self) -> Result<Option<PendingRequest>, SessionError> {
        self.stop_reveal();
        let runner = self.runner.as_mut().ok_or(SessionError::NoTool)?;
        Ok(runner.begin(&self.fields)?)
    }

    /// Apply a finished request to the runner that issued it, if it is still active.
    pub fn complete(&mut self, ticket: Ticket, result: GenerationResult) -> Completion {
        match self.runner.as_mut() {
            Some(runner) => runner.complete(ticket, result),
            None => Completion::Stale,
        }
    }

    pub fn start_edit(&mut self) -> Result<Option<String>, SessionError> {
        Ok(self.active()?.start_edit())
    }

    pub fn save_edit(&mut self, text: &str) -> Result<bool, SessionError> {
        self.stop_reveal();
        Ok(self.active()?.save_edit(text))
    }

    pub fn is_editing(&self) -> bool {
        self.runner.as_ref().is_some_and(ToolRunner::is_editing)
    }

    pub fn start_reveal(&mut self, reveal: Reveal) {
        self.stop_reveal();
        self.reveal = Some(reveal);
    }

    pub fn stop_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.stop();
        }
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.as_ref().is_some_and(|r| !r.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::{RevealSettings, RevealSink};
    use crate::runner::RunState;
    use std::time::Duration;

    struct Ignore;

    #[async_trait::async_trait]
    impl RevealSink for Ignore {
        async fn show(&self, _frame: String) -> bool {
            true
        }

        async fn show_final(&self, _frame: String) {}
    }

    #[test]
    fn test_no_tool_selected() {
        let mut session = Session::default();
        assert_eq!(session.set_primary("x").unwrap_err(), SessionError::NoTool);
        assert_eq!(session.begin().unwrap_err(), SessionError::NoTool);
        assert!(!session.is_editing());
    }

    #[test]
    fn test_select_unknown_tool() {
        let mut session = Session::default();
        assert_eq!(
            session.select("nope").unwrap_err(),
            SessionError::Prompt(PromptError::UnknownTool("nope".to_string()))
        );
    }

    #[test]
    fn test_select_resets_fields_and_runner() {
        let mut session = Session::default();
        session.select("essay-writer").unwrap();
        session.set_primary("Rivers").unwrap();
        let pending = session.begin().unwrap().unwrap();

        session.select("Letter-Writer").unwrap();
        assert_eq!(session.runner().unwrap().template().id(), "letter-writer");
        assert_eq!(session.fields(), &PromptFields::new());
        assert_eq!(
            session.complete(pending.ticket, GenerationResult::text("late")),
            Completion::Stale
        );
        assert_eq!(session.runner().unwrap().state(), RunState::Idle);
    }

    #[test]
    fn test_set_field_uses_canonical_name() {
        let mut session = Session::default();
        session.select("paragraph-writer").unwrap();
        let spec = session.set_field("WORD_COUNT", "200").unwrap();
        assert_eq!(spec.name, "word_count");
        assert_eq!(session.fields().get("word_count"), Some("200"));
    }

    #[test]
    fn test_begin_requires_primary_field() {
        let mut session = Session::default();
        session.select("essay-writer").unwrap();
        assert!(session.begin().unwrap().is_none());
        session.set_primary("Oceans").unwrap();
        assert!(session.begin().unwrap().unwrap().prompt.contains("Oceans"));
    }

    #[tokio::test]
    async fn test_begin_and_edit_stop_reveal() {
        let mut session = Session::default();
        session.select("essay-writer").unwrap();
        session.set_primary("Oceans").unwrap();

        let settings = RevealSettings {
            interval: Duration::from_millis(50),
            chunk_chars: 1,
        };
        session.start_reveal(Reveal::start("long enough text", settings, Arc::new(Ignore)));
        assert!(session.is_revealing());

        let pending = session.begin().unwrap().unwrap();
        assert!(!session.is_revealing());

        session.complete(pending.ticket, GenerationResult::text("Essay"));
        session.start_reveal(Reveal::start("long enough text", settings, Arc::new(Ignore)));
        assert_eq!(session.start_edit().unwrap().as_deref(), Some("Essay"));
        assert!(session.is_editing());
        assert!(session.save_edit("Better essay").unwrap());
        assert!(!session.is_revealing());
        assert!(!session.is_editing());
    }
}
