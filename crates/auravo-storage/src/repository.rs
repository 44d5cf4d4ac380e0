//! Persistence boundary for the conversation collection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use auravo_core::error::{AuravoError, Result};
use auravo_core::Conversation;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Storage key of the serialized collection.
pub const HISTORY_KEY: &str = "chatHistory";

/// Reads and writes the whole conversation collection as one blob.
pub trait ConversationRepository: Send + Sync {
    /// The persisted collection, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<Conversation>>>;

    /// Replace the persisted collection.
    fn save(&self, conversations: &[Conversation]) -> Result<()>;
}

impl<R: ConversationRepository + ?Sized> ConversationRepository for Arc<R> {
    fn load(&self) -> Result<Option<Vec<Conversation>>> {
        (**self).load()
    }

    fn save(&self, conversations: &[Conversation]) -> Result<()> {
        (**self).save(conversations)
    }
}

/// Repository backed by `<data_dir>/chatHistory.json`.
///
/// Writes go to a sibling temp file that is renamed over the target. A file
/// that fails to parse is moved aside and treated as absent.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Repository storing the history file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(format!("{}.json", HISTORY_KEY)))
    }

    /// Repository storing the history at an exact path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn quarantine(&self, reason: &str) -> Result<()> {
        let aside = self.path.with_extension(format!(
            "json.corrupt-{}",
            Utc::now().timestamp_millis()
        ));
        std::fs::rename(&self.path, &aside)?;
        warn!(
            path = %self.path.display(),
            moved_to = %aside.display(),
            reason = %reason,
            "Unreadable chat history moved aside"
        );
        Ok(())
    }
}

impl ConversationRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<Vec<Conversation>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No chat history on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<Conversation>>(&content) {
            Ok(conversations) => {
                info!(
                    path = %self.path.display(),
                    conversations = conversations.len(),
                    "Chat history loaded"
                );
                Ok(Some(conversations))
            }
            Err(e) => {
                self.quarantine(&e.to_string())?;
                Ok(None)
            }
        }
    }

    fn save(&self, conversations: &[Conversation]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(conversations)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(
            path = %self.path.display(),
            conversations = conversations.len(),
            "Chat history saved"
        );
        Ok(())
    }
}

/// In-memory repository holding the serialized blob.
///
/// Data still goes through JSON so the same encoding is exercised as on disk.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    blob: Mutex<Option<String>>,
    saves: Mutex<usize>,
    fail_saves: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with a raw blob.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            ..Self::default()
        }
    }

    /// Repository whose every save fails.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// The last saved blob.
    pub fn blob(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|b| b.clone())
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or(0)
    }
}

impl ConversationRepository for MemoryRepository {
    fn load(&self) -> Result<Option<Vec<Conversation>>> {
        let blob = self
            .blob
            .lock()
            .map_err(|e| AuravoError::Storage(format!("blob lock poisoned: {}", e)))?;
        match blob.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, conversations: &[Conversation]) -> Result<()> {
        if self.fail_saves {
            return Err(AuravoError::Storage("storage quota exceeded".to_string()));
        }
        let raw = serde_json::to_string(conversations)?;
        let mut blob = self
            .blob
            .lock()
            .map_err(|e| AuravoError::Storage(format!("blob lock poisoned: {}", e)))?;
        *blob = Some(raw);
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use auravo_core::{ConversationId, DataUri, Message, MessageContent};

    fn sample() -> Vec<Conversation> {
        let mut first = Conversation::new(ConversationId::from_millis(2));
        first.title = "Cat Pictures".to_string();
        first.messages.push(Message::user(MessageContent::text("/imagine a cat")));
        first.messages.push(Message::model(MessageContent::Image(DataUri::from_bytes(
            "image/png",
            b"png",
        ))));
        let second = Conversation::new(ConversationId::from_millis(1));
        vec![first, second]
    }

    #[test]
    fn test_file_repository_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        assert!(repo.load().unwrap().is_none());
        assert!(repo.path().ends_with("chatHistory.json"));
    }

    #[test]
    fn test_file_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(&dir.path().join("nested"));
        let conversations = sample();
        repo.save(&conversations).unwrap();
        assert_eq!(repo.load().unwrap(), Some(conversations));
        assert!(!repo.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_repository_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        repo.save(&sample()).unwrap();
        let single = vec![Conversation::new(ConversationId::from_millis(7))];
        repo.save(&single).unwrap();
        assert_eq!(repo.load().unwrap(), Some(single));
    }

    #[test]
    fn test_file_repository_quarantines_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        std::fs::write(repo.path(), "{ not json").unwrap();

        assert!(repo.load().unwrap().is_none());
        assert!(!repo.path().exists());
        let moved: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .collect();
        assert_eq!(moved.len(), 1);
    }

    #[test]
    fn test_file_repository_reads_legacy_blob() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        std::fs::write(
            repo.path(),
            r#"[{"id":"chat-1","title":"New Chat","messages":[
                {"role":"user","content":"Hello"},
                {"role":"model","content":"data:image/png;base64,AAAA"}
            ]}]"#,
        )
        .unwrap();
        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded[0].messages.len(), 2);
        assert!(!loaded[0].messages[0].content.is_image());
        assert!(loaded[0].messages[1].content.is_image());
    }

    #[test]
    fn test_memory_repository_round_trip() {
        let repo = MemoryRepository::new();
        assert!(repo.load().unwrap().is_none());
        repo.save(&sample()).unwrap();
        assert_eq!(repo.load().unwrap(), Some(sample()));
        assert_eq!(repo.save_count(), 1);
        assert!(repo.blob().unwrap().contains("Cat Pictures"));
    }

    #[test]
    fn test_memory_repository_failing() {
        let repo = MemoryRepository::failing();
        assert!(repo.save(&sample()).is_err());
        assert_eq!(repo.save_count(), 0);
        assert!(repo.blob().is_none());
    }

    #[test]
    fn test_memory_repository_bad_blob() {
        let repo = MemoryRepository::with_blob("[{]");
        assert!(matches!(repo.load(), Err(AuravoError::Serialization(_))));
    }
}
