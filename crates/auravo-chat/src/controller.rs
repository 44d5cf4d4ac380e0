//! Conversation controller: the one place conversations change.
//!
//! A send appends the user message, asks the gateway for a reply, appends
//! the reply (or a fixed apology) and, after a first exchange the model
//! actually answered, starts a background task that names the conversation.

use std::sync::{Arc, Mutex, MutexGuard};

use auravo_core::{Conversation, ConversationEntry, ConversationId, Message, MessageContent};
use auravo_gateway::{ChatRequest, HistoryTurn, ImageRequest, ModelGateway, SummaryRequest};
use auravo_storage::{ConversationStore, StoreError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::directive::Directive;
use crate::error::ChatError;
use crate::title::needs_title;

/// Model reply stored when the gateway call fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Result of [`ConversationController::send_message`].
#[derive(Debug)]
pub enum SendOutcome {
    /// The effective text was blank; nothing changed.
    Ignored,
    Sent {
        /// The model message that was appended.
        reply: Message,
        /// Title summarization started by this exchange, if any.
        title_task: Option<JoinHandle<()>>,
    },
}

impl SendOutcome {
    pub fn reply(&self) -> Option<&Message> {
        match self {
            SendOutcome::Ignored => None,
            SendOutcome::Sent { reply, .. } => Some(reply),
        }
    }

    /// Take the title task handle, leaving the caller to await it.
    pub fn into_title_task(self) -> Option<JoinHandle<()>> {
        match self {
            SendOutcome::Ignored => None,
            SendOutcome::Sent { title_task, .. } => title_task,
        }
    }

    /// Wait for the title task, if one was started.
    pub async fn settle(self) {
        if let Some(handle) = self.into_title_task() {
            if let Err(e) = handle.await {
                error!(error = %e, "Title task panicked");
            }
        }
    }
}

/// Coordinates the conversation store and the model gateway.
#[derive(Clone)]
pub struct ConversationController {
    gateway: Arc<dyn ModelGateway>,
    store: Arc<Mutex<ConversationStore>>,
}

impl ConversationController {
    pub fn new(gateway: Arc<dyn ModelGateway>, store: ConversationStore) -> Self {
        Self {
            gateway,
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn gateway(&self) -> Arc<dyn ModelGateway> {
        Arc::clone(&self.gateway)
    }

    /// Start a fresh conversation at the front and make it current.
    pub fn new_conversation(&self) -> Result<ConversationId, ChatError> {
        let mut store = lock(&self.store)?;
        match store.create_conversation() {
            Ok(id) => Ok(id),
            Err(StoreError::Persistence(e)) => {
                warn!(error = %e, "New conversation not persisted");
                store
                    .current_id()
                    .cloned()
                    .ok_or_else(|| ChatError::State("no current conversation".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn select_conversation(&self, id: &ConversationId) -> Result<(), ChatError> {
        lock(&self.store)?.select(id)?;
        Ok(())
    }

    pub fn current_id(&self) -> Result<Option<ConversationId>, ChatError> {
        Ok(lock(&self.store)?.current_id().cloned())
    }

    pub fn current(&self) -> Result<Option<Conversation>, ChatError> {
        Ok(lock(&self.store)?.current().cloned())
    }

    /// Listing of every conversation, newest first.
    pub fn conversations(&self) -> Result<Vec<ConversationEntry>, ChatError> {
        Ok(lock(&self.store)?.entries())
    }

    pub fn messages(&self, id: &ConversationId) -> Result<Vec<Message>, ChatError> {
        lock(&self.store)?
            .get(id)
            .map(|c| c.messages.clone())
            .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))
    }

    /// Mark the last message of a conversation as fully revealed.
    pub fn finish_streaming(&self, id: &ConversationId) -> Result<bool, ChatError> {
        let mut store = lock(&self.store)?;
        match store.finish_streaming(id) {
            Ok(changed) => Ok(changed),
            Err(StoreError::Persistence(e)) => {
                warn!(conversation_id = %id, error = %e, "Streaming flag change not persisted");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Send a message in a conversation.
    ///
    /// `content` is stored as the user message; `prompt_override`, when
    /// present, is what the model actually receives. Gateway failures are
    /// logged and stored as [`FALLBACK_MESSAGE`]; they are never returned.
    pub async fn send_message(
        &self,
        id: &ConversationId,
        content: &str,
        prompt_override: Option<&str>,
    ) -> Result<SendOutcome, ChatError> {
        let effective = prompt_override.unwrap_or(content).trim();
        if effective.is_empty() {
            debug!(conversation_id = %id, "Blank submission ignored");
            return Ok(SendOutcome::Ignored);
        }
        let shown = if content.trim().is_empty() {
            effective
        } else {
            content.trim()
        };

        let history = {
            let mut store = lock(&self.store)?;
            let history: Vec<HistoryTurn> = store
                .get(id)
                .ok_or_else(|| ChatError::ConversationNotFound(id.clone()))?
                .messages
                .iter()
                .map(HistoryTurn::from)
                .collect();
            append(&mut store, id, Message::user(MessageContent::text(shown)))?;
            history
        };

        let directive = Directive::parse(effective);
        info!(
            conversation_id = %id,
            history_len = history.len(),
            image = directive.is_image(),
            "Sending message"
        );
        let (reply, answered) = self.request_reply(id, history, directive).await;

        let title_task = {
            let mut store = lock(&self.store)?;
            append(&mut store, id, reply.clone())?;
            match store.get(id) {
                Some(conversation) if answered && needs_title(conversation) => {
                    Some(self.spawn_title_task(id.clone(), conversation.transcript()))
                }
                _ => None,
            }
        };

        Ok(SendOutcome::Sent { reply, title_task })
    }

    /// The model message to append, and whether the model produced it.
    async fn request_reply(
        &self,
        id: &ConversationId,
        history: Vec<HistoryTurn>,
        directive: Directive,
    ) -> (Message, bool) {
        let result = match directive {
            Directive::Chat(prompt) => self
                .gateway
                .chat(ChatRequest::new(history, prompt))
                .await
                .map(|reply| Message::model(MessageContent::text(reply.response)).streaming()),
            Directive::Image(prompt) => self
                .gateway
                .generate_image(ImageRequest::new(prompt))
                .await
                .map(|generated| Message::model(MessageContent::Image(generated.image))),
        };

        match result {
            Ok(message) => (message, true),
            Err(e) => {
                error!(conversation_id = %id, error = %e, "Model request failed");
                (Message::model(MessageContent::text(FALLBACK_MESSAGE)), false)
            }
        }
    }

    fn spawn_title_task(&self, id: ConversationId, transcript: String) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let summary = match gateway
                .summarize_conversation(SummaryRequest::new(transcript))
                .await
            {
                Ok(summary) => summary.summary.trim().to_string(),
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "Title summarization failed");
                    return;
                }
            };
            if summary.is_empty() {
                warn!(conversation_id = %id, "Title summarization returned nothing");
                return;
            }

            let mut store = match lock(&store) {
                Ok(store) => store,
                Err(e) => {
                    error!(conversation_id = %id, error = %e, "Title not applied");
                    return;
                }
            };
            if !store.get(&id).is_some_and(Conversation::has_default_title) {
                debug!(conversation_id = %id, "Title already set, summary discarded");
                return;
            }
            match store.set_title(&id, summary.clone()) {
                Ok(()) => info!(conversation_id = %id, title = %summary, "Conversation titled"),
                Err(e) => warn!(conversation_id = %id, error = %e, "Title not persisted"),
            }
        })
    }
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController").finish_non_exhaustive()
    }
}

fn lock(store: &Mutex<ConversationStore>) -> Result<MutexGuard<'_, ConversationStore>, ChatError> {
    store
        .lock()
        .map_err(|e| ChatError::State(format!("store lock poisoned: {}", e)))
}

/// Append, tolerating a failed write: the message stays in memory.
fn append(
    store: &mut ConversationStore,
    id: &ConversationId,
    message: Message,
) -> Result<(), ChatError> {
    match store.append_message(id, message) {
        Ok(_) => Ok(()),
        Err(StoreError::Persistence(e)) => {
            warn!(conversation_id = %id, error = %e, "Conversation change not persisted");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use auravo_gateway::{GatewayCall, MockGateway};
    use auravo_storage::MemoryRepository;

    fn controller(
        gateway: MockGateway,
    ) -> (ConversationController, Arc<MockGateway>, ConversationId) {
        let gateway = Arc::new(gateway);
        let store = ConversationStore::open(Box::new(MemoryRepository::new())).unwrap();
        let controller =
            ConversationController::new(Arc::clone(&gateway) as Arc<dyn ModelGateway>, store);
        let id = controller.current_id().unwrap().unwrap();
        (controller, gateway, id)
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (controller, gateway, id) = controller(MockGateway::new());
        let outcome = controller.send_message(&id, "   ", None).await.unwrap();
        assert!(matches!(outcome, SendOutcome::Ignored));
        assert!(controller.messages(&id).unwrap().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_override_is_ignored() {
        let (controller, _, id) = controller(MockGateway::new());
        let outcome = controller.send_message(&id, "Hello", Some(" ")).await.unwrap();
        assert!(matches!(outcome, SendOutcome::Ignored));
        assert!(controller.messages(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_conversation() {
        let (controller, gateway, _) = controller(MockGateway::new());
        let missing = ConversationId::from("chat-missing");
        let err = controller.send_message(&missing, "Hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotFound(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reply_is_streaming_text() {
        let (controller, _, id) = controller(MockGateway::new().with_chat_reply("Hi there!"));
        let outcome = controller.send_message(&id, "Hello", None).await.unwrap();
        let reply = outcome.reply().unwrap();
        assert!(reply.is_streaming);
        assert_eq!(reply.content, MessageContent::text("Hi there!"));
        outcome.settle().await;
    }

    #[tokio::test]
    async fn test_history_excludes_new_message() {
        let (controller, gateway, id) = controller(MockGateway::new());
        controller.send_message(&id, "one", None).await.unwrap().settle().await;
        controller.send_message(&id, "two", None).await.unwrap().settle().await;

        let chats: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::Chat { .. }))
            .collect();
        assert_eq!(
            chats,
            vec![
                GatewayCall::Chat {
                    history_len: 0,
                    prompt: "one".to_string()
                },
                GatewayCall::Chat {
                    history_len: 2,
                    prompt: "two".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_override_sent_content_stored() {
        let (controller, gateway, id) = controller(MockGateway::new());
        controller
            .send_message(&id, "a cat", Some("/imagine a cat"))
            .await
            .unwrap()
            .settle()
            .await;

        let messages = controller.messages(&id).unwrap();
        assert_eq!(messages[0].content, MessageContent::text("a cat"));
        assert!(messages[1].content.is_image());
        assert!(!messages[1].is_streaming);
        assert_eq!(gateway.image_calls(), 1);
        assert_eq!(gateway.chat_calls(), 0);
    }

    #[tokio::test]
    async fn test_image_failure_falls_back() {
        let (controller, _, id) = controller(MockGateway::new().failing_image("blocked"));
        controller
            .send_message(&id, "/imagine a cat", None)
            .await
            .unwrap()
            .settle()
            .await;
        let messages = controller.messages(&id).unwrap();
        assert_eq!(messages[1].content, MessageContent::text(FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn test_fallback_reply_starts_no_title_task() {
        let (controller, gateway, id) = controller(MockGateway::new().failing_chat("boom"));
        let outcome = controller.send_message(&id, "Hello", None).await.unwrap();
        assert_eq!(outcome.reply().unwrap().content.as_str(), FALLBACK_MESSAGE);
        assert!(outcome.into_title_task().is_none());
        assert_eq!(gateway.summary_calls(), 0);
    }

    #[tokio::test]
    async fn test_first_exchange_returns_title_task() {
        let (controller, _, id) = controller(MockGateway::new());
        let outcome = controller.send_message(&id, "Hello", None).await.unwrap();
        let handle = outcome.into_title_task().unwrap();
        handle.await.unwrap();
        assert_eq!(
            controller.current().unwrap().unwrap().title,
            "Mock Conversation"
        );
    }

    #[tokio::test]
    async fn test_finish_streaming() {
        let (controller, _, id) = controller(MockGateway::new());
        controller.send_message(&id, "Hello", None).await.unwrap().settle().await;
        assert!(controller.finish_streaming(&id).unwrap());
        assert!(!controller.messages(&id).unwrap()[1].is_streaming);
        assert!(!controller.finish_streaming(&id).unwrap());
    }

    #[tokio::test]
    async fn test_new_and_select_conversation() {
        let (controller, _, first) = controller(MockGateway::new());
        let second = controller.new_conversation().unwrap();
        assert_eq!(controller.current_id().unwrap(), Some(second.clone()));

        let entries = controller.conversations().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);

        controller.select_conversation(&first).unwrap();
        assert_eq!(controller.current().unwrap().unwrap().id, first);

        let err = controller
            .select_conversation(&ConversationId::from("chat-0"))
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_block_send() {
        let gateway: Arc<dyn ModelGateway> = Arc::new(MockGateway::new().with_chat_reply("Hi"));
        let store = ConversationStore::open(Box::new(MemoryRepository::failing())).unwrap();
        let controller = ConversationController::new(gateway, store);
        let id = controller.current_id().unwrap().unwrap();

        controller.send_message(&id, "Hello", None).await.unwrap().settle().await;
        assert_eq!(controller.messages(&id).unwrap().len(), 2);
        assert!(controller.new_conversation().is_ok());
    }
}
