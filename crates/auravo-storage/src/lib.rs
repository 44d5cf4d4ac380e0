//! Auravo Storage crate - the conversation collection and its persistence.
//!
//! The whole collection is written as one JSON blob on every mutation and
//! read back once at startup.

pub mod error;
pub mod repository;
pub mod store;

pub use error::StoreError;
pub use repository::{ConversationRepository, JsonFileRepository, MemoryRepository, HISTORY_KEY};
pub use store::ConversationStore;
