//! When a conversation gets its generated title.

use auravo_core::Conversation;

/// True right after the first user/model exchange of a conversation that
/// still carries the placeholder title.
pub fn needs_title(conversation: &Conversation) -> bool {
    conversation.messages.len() == 2 && conversation.has_default_title()
}
