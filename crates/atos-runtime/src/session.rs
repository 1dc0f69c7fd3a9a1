//! Caller-owned conversation state.
//!
//! History lives in a [`ConversationSession`] the caller creates and drops.
//! Nothing in the adapter keeps state between turns.

use atos_core::{CaseSnapshot, Module};

use crate::adapter::{ConversationRequest, ConversationalAdapter, ConversationalResponse};
use crate::providers::ChatMessage;

/// Running conversation about one module of one case.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    module: Module,
    history: Vec<ChatMessage>,
    max_turns: Option<usize>,
}

impl ConversationSession {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            history: Vec::new(),
            max_turns: None,
        }
    }

    /// Keep at most `turns` user/assistant pairs in history.
    pub fn with_max_turns(mut self, turns: usize) -> Self {
        self.max_turns = Some(turns);
        self
    }

    pub fn module(&self) -> Module {
        self.module
    }

    /// Switch module; history is kept.
    pub fn set_module(&mut self, module: Module) {
        self.module = module;
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Ask one question and record both turns.
    pub async fn ask(
        &mut self,
        adapter: &ConversationalAdapter,
        snapshot: &CaseSnapshot,
        message: &str,
    ) -> ConversationalResponse {
        let response = adapter
            .respond(ConversationRequest::new(self.module, snapshot, message).with_history(&self.history))
            .await;

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(response.message.clone()));
        self.trim();
        response
    }

    fn trim(&mut self) {
        if let Some(turns) = self.max_turns {
            let keep = turns * 2;
            if self.history.len() > keep {
                self.history.drain(..self.history.len() - keep);
            }
        }
    }
}
