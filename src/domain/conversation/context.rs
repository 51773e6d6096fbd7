//! Conversation context aggregate.
//!
//! Holds everything known about one call: history, detected entities, current
//! state, last intent and free-form metadata. History is append-only and the
//! state only moves along legal edges of the conversation state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ContextEntry, ConversationState, Entity, FlowEvent, Intent, Message, MessageRole};
use crate::domain::foundation::{ConversationId, DomainError, StateMachine};

const PERSONA_PROMPT: &str = "You are a helpful and professional customer service AI assistant \
answering a phone call. Keep every reply short and conversational because it will be spoken \
aloud. You can help with password resets, billing questions, technical problems and account \
access. When you cannot resolve an issue, offer to create a support ticket so a human agent \
can follow up by email or phone.";

/// The per-call state container.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    conversation_id: ConversationId,
    current_state: ConversationState,
    messages: Vec<Message>,
    detected_entities: BTreeMap<String, Entity>,
    last_intent: Option<Intent>,
    metadata: BTreeMap<String, String>,
    /// Index of the first message of the issue currently being handled.
    issue_start: usize,
    created_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Creates an empty context in `Greeting`.
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            current_state: ConversationState::Greeting,
            messages: Vec::new(),
            detected_entities: BTreeMap::new(),
            last_intent: None,
            metadata: BTreeMap::new(),
            issue_start: 0,
            created_at: Utc::now(),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn current_state(&self) -> ConversationState {
        self.current_state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn detected_entities(&self) -> &BTreeMap<String, Entity> {
        &self.detected_entities
    }

    pub fn entity(&self, entity_type: &str) -> Option<&Entity> {
        self.detected_entities.get(entity_type)
    }

    pub fn last_intent(&self) -> Option<Intent> {
        self.last_intent
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Appends a message and folds its intent and entities into the context.
    ///
    /// An entity replaces the stored entity of the same type only when its
    /// confidence is strictly greater.
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        intent: Option<Intent>,
        entities: Vec<Entity>,
    ) {
        if intent.is_some() {
            self.last_intent = intent;
        }

        for entity in &entities {
            let current = self
                .detected_entities
                .get(entity.entity_type())
                .map(Entity::confidence)
                .unwrap_or(0.0);
            if entity.confidence() > current {
                self.detected_entities
                    .insert(entity.entity_type().to_string(), entity.clone());
            }
        }

        self.messages.push(Message::new(role, content, intent, entities));
    }

    /// Moves to `new_state` if the state machine allows it.
    ///
    /// Moving to the current state is a no-op. On error the state is unchanged.
    pub fn transition_state(&mut self, new_state: ConversationState) -> Result<(), DomainError> {
        if new_state == self.current_state {
            return Ok(());
        }
        self.current_state = self.current_state.transition_to(new_state)?;
        Ok(())
    }

    /// Applies a flow event, returning the new state.
    pub fn apply(&mut self, event: FlowEvent) -> Result<ConversationState, DomainError> {
        let next = self
            .current_state
            .on(event)
            .ok_or_else(|| DomainError::invalid_transition(self.current_state, event))?;
        self.current_state = next;
        Ok(next)
    }

    /// Records a metadata value, overwriting any previous value for `key`.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<String> {
        self.metadata.remove(key)
    }

    /// Starts a new issue within the same call at message index `first_message`
    /// (clamped to the end of history). Earlier messages stay in history.
    pub fn start_new_issue(&mut self, first_message: usize) {
        self.issue_start = first_message.min(self.messages.len());
    }

    /// Messages belonging to the issue currently being handled, oldest first.
    pub fn issue_messages(&self) -> &[Message] {
        &self.messages[self.issue_start..]
    }

    /// Returns the most recent `max_messages` messages, preceded by a
    /// synthesized system entry describing the conversation so far.
    pub fn get_context_window(&self, max_messages: usize) -> Vec<ContextEntry> {
        let start = self.messages.len().saturating_sub(max_messages);
        let mut window = Vec::with_capacity(self.messages.len() - start + 1);
        window.push(ContextEntry::system(self.system_prompt()));
        window.extend(self.messages[start..].iter().map(ContextEntry::from));
        window
    }

    /// Builds the system prompt for response generation.
    pub fn system_prompt(&self) -> String {
        let entities = if self.detected_entities.is_empty() {
            "none".to_string()
        } else {
            self.detected_entities
                .iter()
                .map(|(kind, entity)| format!("{}: {}", kind, entity.value()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let intent = self
            .last_intent
            .map(|i| i.to_string())
            .unwrap_or_else(|| "none".to_string());

        format!(
            "{}\n\nCurrent conversation state: {}\nDetected entities: {}\nLast intent: {}",
            PERSONA_PROMPT, self.current_state, entities, intent
        )
    }

    /// Returns up to `n` of the most recent user messages, oldest first.
    pub fn recent_user_messages(&self, n: usize) -> Vec<&Message> {
        let mut recent: Vec<&Message> = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.is_user())
            .take(n)
            .collect();
        recent.reverse();
        recent
    }

    /// Returns the latest assistant message, if any.
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }
}
