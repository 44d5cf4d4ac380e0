//! The in-memory conversation collection.
//!
//! Conversations are kept newest-first. Every mutation writes the whole
//! collection through the repository; an empty collection is never written.

use auravo_core::{Conversation, ConversationEntry, ConversationId, Message};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::repository::ConversationRepository;

/// Ordered conversations plus the current selection.
///
/// Invariant: whenever the collection is non-empty, `current` names one of
/// its conversations.
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<ConversationId>,
    repository: Box<dyn ConversationRepository>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("conversations", &self.conversations.len())
            .field("current", &self.current)
            .finish()
    }
}

impl ConversationStore {
    /// Rehydrate from the repository.
    ///
    /// The newest persisted conversation becomes current. With no persisted
    /// state, or an empty persisted list, one fresh conversation is created;
    /// failing to write it out is logged and the store still opens.
    pub fn open(repository: Box<dyn ConversationRepository>) -> Result<Self, StoreError> {
        let conversations = repository.load()?.unwrap_or_default();
        let current = conversations.first().map(|c| c.id.clone());
        let mut store = Self {
            conversations,
            current,
            repository,
        };

        if store.conversations.is_empty() {
            match store.create_conversation() {
                Ok(_) | Err(StoreError::NotFound(_)) => {}
                Err(StoreError::Persistence(e)) => {
                    warn!(error = %e, "Initial conversation kept in memory only");
                }
            }
        } else {
            info!(
                conversations = store.conversations.len(),
                "Conversation store rehydrated"
            );
        }
        Ok(store)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn current_id(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    /// Listing of all conversations, newest first.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.conversations
            .iter()
            .map(|c| ConversationEntry {
                id: c.id.clone(),
                title: c.title.clone(),
                message_count: c.messages.len(),
                is_current: self.current.as_ref() == Some(&c.id),
            })
            .collect()
    }

    /// Create an empty conversation at the front and make it current.
    pub fn create_conversation(&mut self) -> Result<ConversationId, StoreError> {
        let id = self.unused_id(Utc::now().timestamp_millis());
        self.conversations.insert(0, Conversation::new(id.clone()));
        self.current = Some(id.clone());
        info!(conversation_id = %id, "Conversation created");
        self.persist()?;
        Ok(id)
    }

    /// Make an existing conversation current. Selection is not persisted.
    pub fn select(&mut self, id: &ConversationId) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }
        debug!(conversation_id = %id, "Conversation selected");
        self.current = Some(id.clone());
        Ok(())
    }

    /// Append a message and return the conversation's new message count.
    pub fn append_message(
        &mut self,
        id: &ConversationId,
        message: Message,
    ) -> Result<usize, StoreError> {
        let conversation = self.get_mut(id)?;
        conversation.messages.push(message);
        let count = conversation.messages.len();
        self.persist()?;
        Ok(count)
    }

    pub fn set_title(&mut self, id: &ConversationId, title: String) -> Result<(), StoreError> {
        let conversation = self.get_mut(id)?;
        conversation.title = title;
        self.persist()
    }

    /// Clear the streaming flag of the last message.
    ///
    /// Returns whether anything changed; nothing is written when it did not.
    pub fn finish_streaming(&mut self, id: &ConversationId) -> Result<bool, StoreError> {
        let conversation = self.get_mut(id)?;
        match conversation.messages.last_mut() {
            Some(last) if last.is_streaming => {
                last.is_streaming = false;
                self.persist()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Write the collection through the repository.
    pub fn persist(&self) -> Result<(), StoreError> {
        if self.conversations.is_empty() {
            return Ok(());
        }
        self.repository.save(&self.conversations)?;
        Ok(())
    }

    fn get_mut(&mut self, id: &ConversationId) -> Result<&mut Conversation, StoreError> {
        self.conversations
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// First id at or after `millis` that no conversation uses yet.
    fn unused_id(&self, mut millis: i64) -> ConversationId {
        loop {
            let id = ConversationId::from_millis(millis);
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
