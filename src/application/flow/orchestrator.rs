//! Conversation flow orchestrator.
//!
//! The single authority over a call's conversation: given an utterance it
//! classifies intent, extracts contact details, updates the context, decides
//! the next state and produces what the assistant says next. Every turn
//! returns something speakable, whatever goes wrong underneath.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::{keywords, responses, EscalationError, FlowError, TicketEscalator};
use crate::domain::conversation::{
    extract_contact_info, ContactInfo, ConversationContext, ConversationState, FlowEvent, Intent,
    MessageRole,
};
use crate::domain::foundation::{ConversationId, TicketId};
use crate::ports::{
    Classification, ConversationStore, IntentClassifier, KnowledgeBase, Ticketing,
};

const META_EMAIL: &str = "email";
const META_PHONE: &str = "phone";
const META_ISSUE: &str = "issue";
const META_ISSUE_INTENT: &str = "issue_intent";
const META_TICKET_ID: &str = "ticket_id";
const META_CONFIDENCE: &str = "last_transcript_confidence";

/// Tunables for the conversation flow.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Upper bound on any single collaborator call.
    pub collaborator_timeout: Duration,
    /// Transcripts below this speech-to-text confidence are reprompted.
    pub min_transcript_confidence: f32,
    /// Number of history messages handed to the classifier.
    pub context_window: usize,
    /// Subject line for escalation tickets.
    pub ticket_subject: String,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            collaborator_timeout: Duration::from_secs(10),
            min_transcript_confidence: 0.3,
            context_window: 10,
            ticket_subject: "Voice support request".to_string(),
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    /// What to say to the caller.
    pub response: String,
    /// State after the turn.
    pub state: ConversationState,
    /// True when the assistant said goodbye and the call can be hung up.
    pub call_should_end: bool,
}

/// What a state handler decided to say.
struct Reply {
    text: String,
    end_call: bool,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            end_call: false,
        }
    }

    fn goodbye(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            end_call: true,
        }
    }
}

/// Everything learned about the current utterance before dispatching on state.
struct Turn<'a> {
    text: &'a str,
    intent: Intent,
    wants_human: bool,
    /// Contact details in this utterance alone.
    utterance_contact: ContactInfo,
    /// Contact details across this utterance and recent history.
    combined_contact: ContactInfo,
}

pub struct ConversationFlow {
    store: Arc<dyn ConversationStore>,
    classifier: Arc<dyn IntentClassifier>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    escalator: TicketEscalator,
    settings: FlowSettings,
    kb_ready: OnceCell<()>,
    kb_last_init_failed: AtomicBool,
}

impl ConversationFlow {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        classifier: Arc<dyn IntentClassifier>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        ticketing: Arc<dyn Ticketing>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            store,
            classifier,
            knowledge_base,
            escalator: TicketEscalator::new(ticketing),
            settings,
            kb_ready: OnceCell::new(),
            kb_last_init_failed: AtomicBool::new(false),
        }
    }

    /// Initializes the knowledge base on first use. Only success is cached:
    /// after a failure the current turn runs in escalation-only mode and the
    /// next call tries again.
    pub async fn knowledge_base_ready(&self) -> bool {
        let ready = self
            .kb_ready
            .get_or_try_init(|| async {
                match self.bounded(self.knowledge_base.initialize()).await {
                    Some(Ok(())) => {
                        info!("Knowledge base initialized");
                        Ok(())
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "Knowledge base initialization failed, escalation-only for now");
                        Err(())
                    }
                    None => {
                        warn!("Knowledge base initialization timed out, escalation-only for now");
                        Err(())
                    }
                }
            })
            .await
            .is_ok();
        self.kb_last_init_failed.store(!ready, Ordering::Relaxed);
        ready
    }

    /// `Some(true)` once initialized, `Some(false)` while the last attempt
    /// failed, `None` if never attempted.
    pub fn knowledge_base_status(&self) -> Option<bool> {
        if self.kb_ready.initialized() {
            Some(true)
        } else if self.kb_last_init_failed.load(Ordering::Relaxed) {
            Some(false)
        } else {
            None
        }
    }

    pub async fn active_conversations(&self) -> usize {
        self.store.len().await
    }

    /// Starts a new conversation and returns its id with the greeting.
    pub async fn start_conversation(&self) -> Result<(ConversationId, String), FlowError> {
        let conversation_id = ConversationId::new();
        let mut context = ConversationContext::new(conversation_id);
        context.add_message(MessageRole::Assistant, responses::GREETING, None, vec![]);
        context.apply(FlowEvent::Greeted)?;
        self.store.insert(context).await?;

        info!(%conversation_id, "Conversation started");
        Ok((conversation_id, responses::GREETING.to_string()))
    }

    /// Releases a conversation. Returns false if it was not live.
    pub async fn end_conversation(&self, conversation_id: ConversationId) -> Result<bool, FlowError> {
        let removed = self.store.remove(conversation_id).await?;
        if removed {
            info!(%conversation_id, "Conversation ended");
        }
        Ok(removed)
    }

    /// Returns a copy of the conversation context, if it is live.
    pub async fn snapshot(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationContext>, FlowError> {
        let Some(shared) = self.store.get(conversation_id).await? else {
            return Ok(None);
        };
        let context = shared.lock().await.clone();
        Ok(Some(context))
    }

    /// Processes one utterance and returns the text to speak.
    pub async fn receive_utterance(
        &self,
        conversation_id: ConversationId,
        text: &str,
        confidence: f32,
    ) -> String {
        self.handle_turn(conversation_id, text, confidence)
            .await
            .response
    }

    /// Processes one utterance. Never fails: errors and panics inside the turn
    /// are logged and turned into an apology.
    pub async fn handle_turn(
        &self,
        conversation_id: ConversationId,
        text: &str,
        confidence: f32,
    ) -> TurnOutcome {
        let (shared, created) = match self.store.get_or_create(conversation_id).await {
            Ok(found) => found,
            Err(err) => {
                error!(%conversation_id, utterance = text, error = %err, "Conversation store failed");
                return TurnOutcome {
                    conversation_id,
                    response: responses::APOLOGY.to_string(),
                    state: ConversationState::CollectingIssue,
                    call_should_end: false,
                };
            }
        };

        let mut context = shared.lock().await;
        if created {
            info!(%conversation_id, "Utterance for unknown conversation, starting fresh");
            if let Err(err) = context.apply(FlowEvent::Greeted) {
                warn!(%conversation_id, error = %err, "Could not advance fresh conversation");
            }
        }

        let result = AssertUnwindSafe(self.process_turn(&mut context, text, confidence))
            .catch_unwind()
            .await;

        let reply = match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => self.recover(&mut context, text, &err),
            Err(payload) => {
                let err = FlowError::Panicked(panic_message(payload.as_ref()));
                self.recover(&mut context, text, &err)
            }
        };

        TurnOutcome {
            conversation_id,
            response: reply.text,
            state: context.current_state(),
            call_should_end: reply.end_call,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Turn pipeline
    // ════════════════════════════════════════════════════════════════════════════

    async fn process_turn(
        &self,
        context: &mut ConversationContext,
        text: &str,
        confidence: f32,
    ) -> Result<Reply, FlowError> {
        let conversation_id = context.conversation_id();
        let text = text.trim();
        context.set_metadata(META_CONFIDENCE, format!("{:.2}", confidence));

        if text.is_empty() || confidence < self.settings.min_transcript_confidence {
            debug!(%conversation_id, confidence, "Transcript unusable, reprompting");
            return Ok(Reply::say(responses::REPROMPT));
        }

        let classification = self.classify(context, text).await;
        let intent = keywords::apply_fallbacks(classification.intent, text);
        let turn = Turn {
            text,
            intent,
            wants_human: keywords::wants_human(intent, text),
            utterance_contact: extract_contact_info(text, &[]),
            combined_contact: extract_contact_info(text, context.messages()),
        };

        let mut entities = classification.entities;
        entities.extend(turn.utterance_contact.to_entities());
        context.add_message(MessageRole::User, text, Some(intent), entities);

        if context.current_state().is_transient() {
            // Left over from an interrupted turn.
            context.apply(FlowEvent::SearchAborted)?;
        }
        let state = context.current_state();
        debug!(%conversation_id, %state, %intent, "Dispatching turn");

        let reply = if state != ConversationState::CreatingTicket
            && turn.utterance_contact.is_empty()
            && keywords::is_capability_query(intent, text)
        {
            self.describe_capabilities(context)?
        } else {
            match state {
                ConversationState::Greeting => {
                    context.apply(FlowEvent::Greeted)?;
                    Reply::say(responses::GREETING)
                }
                ConversationState::CollectingIssue | ConversationState::SearchingKb => {
                    self.on_collecting_issue(context, &turn).await?
                }
                ConversationState::ProvidingSolution => {
                    self.on_providing_solution(context, &turn).await?
                }
                ConversationState::CreatingTicket => self.on_creating_ticket(context, &turn).await?,
                ConversationState::Ended => self.on_ended(context, &turn).await?,
            }
        };

        context.add_message(MessageRole::Assistant, reply.text.as_str(), None, vec![]);
        info!(
            %conversation_id,
            from = %state,
            to = %context.current_state(),
            %intent,
            "Turn processed"
        );
        Ok(reply)
    }

    async fn classify(&self, context: &ConversationContext, text: &str) -> Classification {
        let conversation_id = context.conversation_id();
        let window = context.get_context_window(self.settings.context_window);
        match self.bounded(self.classifier.classify(text, &window)).await {
            Some(Ok(classification)) => classification,
            Some(Err(err)) => {
                warn!(%conversation_id, error = %err, "Intent classification failed, using unknown");
                Classification::unknown()
            }
            None => {
                warn!(%conversation_id, "Intent classification timed out, using unknown");
                Classification::unknown()
            }
        }
    }

    fn describe_capabilities(&self, context: &mut ConversationContext) -> Result<Reply, FlowError> {
        let state = context.current_state();
        if state != ConversationState::CollectingIssue {
            context.apply(FlowEvent::CapabilitiesRequested)?;
        }
        if state == ConversationState::Ended {
            let next_message = context.messages().len();
            begin_next_issue(context, next_message);
        }
        Ok(Reply::say(responses::CAPABILITIES))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // State handlers
    // ════════════════════════════════════════════════════════════════════════════

    async fn on_collecting_issue(
        &self,
        context: &mut ConversationContext,
        turn: &Turn<'_>,
    ) -> Result<Reply, FlowError> {
        if turn.intent.is_issue() {
            record_issue(context, turn);
        }

        // Contact details win over searching: volunteering them means "escalate".
        if !turn.utterance_contact.is_empty() {
            remember_contact(context, &turn.utterance_contact);
            context.apply(FlowEvent::ContactProvided)?;
            return self.attempt_ticket(context).await;
        }

        if turn.intent == Intent::EndConversation {
            return self.say_goodbye(context).await;
        }

        if turn.wants_human {
            context.apply(FlowEvent::EscalationRequested)?;
            return Ok(Reply::say(responses::HUMAN_REQUESTED));
        }

        record_issue(context, turn);

        if !self.knowledge_base_ready().await {
            context.apply(FlowEvent::NoSolution)?;
            return Ok(Reply::say(responses::KNOWLEDGE_BASE_UNAVAILABLE));
        }

        context.apply(FlowEvent::SearchStarted)?;
        let conversation_id = context.conversation_id();
        match self.bounded(self.knowledge_base.search_and_summarize(turn.text)).await {
            Some(Ok(Some(summary))) => {
                context.apply(FlowEvent::SolutionFound)?;
                Ok(Reply::say(responses::solution(&summary)))
            }
            Some(Ok(None)) => {
                info!(%conversation_id, "No relevant article, escalating");
                context.apply(FlowEvent::NoSolution)?;
                Ok(Reply::say(responses::NO_ARTICLE_FOUND))
            }
            Some(Err(err)) => {
                warn!(%conversation_id, error = %err, "Knowledge base search failed, escalating");
                context.apply(FlowEvent::NoSolution)?;
                Ok(Reply::say(responses::KNOWLEDGE_BASE_UNAVAILABLE))
            }
            None => {
                warn!(%conversation_id, "Knowledge base search timed out, escalating");
                context.apply(FlowEvent::NoSolution)?;
                Ok(Reply::say(responses::KNOWLEDGE_BASE_UNAVAILABLE))
            }
        }
    }

    async fn on_providing_solution(
        &self,
        context: &mut ConversationContext,
        turn: &Turn<'_>,
    ) -> Result<Reply, FlowError> {
        if !turn.utterance_contact.is_empty() {
            remember_contact(context, &turn.utterance_contact);
            context.apply(FlowEvent::ContactProvided)?;
            return self.attempt_ticket(context).await;
        }

        match turn.intent {
            Intent::Confirm => {
                context.apply(FlowEvent::Confirmed)?;
                Ok(Reply::say(responses::GLAD_TO_HELP))
            }
            Intent::Deny => {
                context.apply(FlowEvent::Denied)?;
                Ok(Reply::say(responses::SOLUTION_DENIED))
            }
            Intent::EndConversation => self.say_goodbye(context).await,
            _ if turn.wants_human => {
                context.apply(FlowEvent::EscalationRequested)?;
                Ok(Reply::say(responses::HUMAN_REQUESTED))
            }
            _ => Ok(self.retry_search(context, turn.text).await),
        }
    }

    async fn on_creating_ticket(
        &self,
        context: &mut ConversationContext,
        turn: &Turn<'_>,
    ) -> Result<Reply, FlowError> {
        if turn.combined_contact.is_empty() {
            return Ok(Reply::say(responses::ASK_CONTACT_AGAIN));
        }
        remember_contact(context, &turn.combined_contact);
        self.attempt_ticket(context).await
    }

    async fn on_ended(
        &self,
        context: &mut ConversationContext,
        turn: &Turn<'_>,
    ) -> Result<Reply, FlowError> {
        match turn.intent {
            Intent::Confirm => {
                context.apply(FlowEvent::Confirmed)?;
                let next_message = context.messages().len();
                begin_next_issue(context, next_message);
                Ok(Reply::say(responses::WHAT_ELSE))
            }
            Intent::Deny | Intent::EndConversation => Ok(Reply::goodbye(responses::FAREWELL)),
            intent => {
                context.apply(FlowEvent::Reengaged)?;
                let this_message = context.messages().len().saturating_sub(1);
                begin_next_issue(context, this_message);
                if intent.is_issue() || !turn.utterance_contact.is_empty() || turn.wants_human {
                    self.on_collecting_issue(context, turn).await
                } else {
                    Ok(Reply::say(responses::REENGAGE))
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Collaborator steps
    // ════════════════════════════════════════════════════════════════════════════

    /// Searches again with a follow-up utterance, staying in `ProvidingSolution`.
    async fn retry_search(&self, context: &ConversationContext, text: &str) -> Reply {
        let conversation_id = context.conversation_id();
        if !self.knowledge_base_ready().await {
            return Reply::say(responses::ASK_FOR_DETAIL);
        }
        match self.bounded(self.knowledge_base.search_and_summarize(text)).await {
            Some(Ok(Some(summary))) => Reply::say(responses::solution(&summary)),
            Some(Ok(None)) => Reply::say(responses::ASK_FOR_DETAIL),
            Some(Err(err)) => {
                warn!(%conversation_id, error = %err, "Follow-up search failed");
                Reply::say(responses::ASK_FOR_DETAIL)
            }
            None => {
                warn!(%conversation_id, "Follow-up search timed out");
                Reply::say(responses::ASK_FOR_DETAIL)
            }
        }
    }

    /// Tries to file a ticket from the stored contact details. Success ends
    /// the conversation; failure keeps `CreatingTicket` so the caller can retry.
    async fn attempt_ticket(&self, context: &mut ConversationContext) -> Result<Reply, FlowError> {
        let conversation_id = context.conversation_id();
        match self.file_ticket(context).await {
            Ok(ticket_id) => {
                context.set_metadata(META_TICKET_ID, ticket_id.as_str());
                context.apply(FlowEvent::TicketCreated)?;
                Ok(Reply::say(responses::ticket_created(ticket_id.as_str())))
            }
            Err(Some(EscalationError::Validation(_))) => Ok(Reply::say(responses::INVALID_CONTACT)),
            Err(Some(EscalationError::Creation(_))) => Ok(Reply::say(responses::TICKET_FAILED)),
            Err(None) => {
                warn!(%conversation_id, "Ticket creation timed out");
                Ok(Reply::say(responses::TICKET_FAILED))
            }
        }
    }

    /// Farewell from `CollectingIssue` or `ProvidingSolution`. If contact
    /// details are already on file and the current issue has no ticket yet,
    /// a ticket is filed first.
    async fn say_goodbye(&self, context: &mut ConversationContext) -> Result<Reply, FlowError> {
        let has_contact = context.metadata_value(META_EMAIL).is_some()
            || context.metadata_value(META_PHONE).is_some();
        let open_issue = context.metadata_value(META_ISSUE).is_some()
            && context.metadata_value(META_TICKET_ID).is_none();
        let ticket = if has_contact && open_issue {
            self.file_ticket(context).await.ok()
        } else {
            None
        };

        context.apply(FlowEvent::Farewell)?;
        match ticket {
            Some(ticket_id) => {
                context.set_metadata(META_TICKET_ID, ticket_id.as_str());
                Ok(Reply::goodbye(responses::farewell_with_ticket(ticket_id.as_str())))
            }
            None => Ok(Reply::goodbye(responses::FAREWELL)),
        }
    }

    /// Files a ticket. `Err(None)` means the helpdesk did not answer in time.
    async fn file_ticket(
        &self,
        context: &ConversationContext,
    ) -> Result<TicketId, Option<EscalationError>> {
        let subject = self.ticket_subject(context);
        let contents = context.metadata_value(META_ISSUE).unwrap_or_default();
        let email = context.metadata_value(META_EMAIL);
        let phone = context.metadata_value(META_PHONE);

        match self
            .bounded(self.escalator.create_ticket(context, &subject, contents, email, phone))
            .await
        {
            Some(Ok(ticket_id)) => Ok(ticket_id),
            Some(Err(err)) => Err(Some(err)),
            None => Err(None),
        }
    }

    fn ticket_subject(&self, context: &ConversationContext) -> String {
        match context.metadata_value(META_ISSUE_INTENT) {
            Some(intent) => format!("{}: {}", self.settings.ticket_subject, intent.replace('_', " ")),
            None => self.settings.ticket_subject.clone(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure handling
    // ════════════════════════════════════════════════════════════════════════════

    /// Logs a failed turn with a snapshot of the context and returns the apology.
    fn recover(&self, context: &mut ConversationContext, text: &str, err: &FlowError) -> Reply {
        let conversation_id = context.conversation_id();
        if context.current_state().is_transient() {
            if let Err(rollback) = context.apply(FlowEvent::SearchAborted) {
                warn!(%conversation_id, error = %rollback, "Rollback from search failed");
            }
        }

        let snapshot = serde_json::to_string(&*context)
            .unwrap_or_else(|e| format!("<unserializable context: {}>", e));
        error!(
            %conversation_id,
            utterance = text,
            error = %err,
            context = %snapshot,
            "Turn failed"
        );

        context.add_message(MessageRole::Assistant, responses::APOLOGY, None, vec![]);
        Reply::say(responses::APOLOGY)
    }

    /// Runs a collaborator call with the configured time limit.
    async fn bounded<F, T>(&self, call: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.settings.collaborator_timeout, call)
            .await
            .ok()
    }
}

/// Notes the caller's problem the first time it is described.
fn record_issue(context: &mut ConversationContext, turn: &Turn<'_>) {
    if context.metadata_value(META_ISSUE).is_none() {
        context.set_metadata(META_ISSUE, turn.text);
    }
    if turn.intent.is_issue() {
        context.set_metadata(META_ISSUE_INTENT, turn.intent.as_str());
    }
}

/// Forgets the finished issue and its ticket. Contact details stay on file.
fn begin_next_issue(context: &mut ConversationContext, first_message: usize) {
    for key in [META_ISSUE, META_ISSUE_INTENT, META_TICKET_ID] {
        context.remove_metadata(key);
    }
    context.start_new_issue(first_message);
}

fn remember_contact(context: &mut ConversationContext, contact: &ContactInfo) {
    if let Some(email) = &contact.email {
        context.set_metadata(META_EMAIL, email.as_str());
    }
    if let Some(phone) = &contact.phone {
        context.set_metadata(META_PHONE, phone.as_str());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
