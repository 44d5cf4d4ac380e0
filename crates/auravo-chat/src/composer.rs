//! The text input and its mode.

use crate::directive::Directive;

/// Whether submitted text is chat or an image prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Text,
    Image,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMode::Text => write!(f, "Text"),
            InputMode::Image => write!(f, "Image"),
        }
    }
}

/// Arguments for [`ConversationController::send_message`](crate::ConversationController::send_message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// What the user typed; stored as the user message.
    pub content: String,
    /// Text sent to the model instead of `content`.
    pub prompt_override: Option<String>,
}

impl Submission {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_override: None,
        }
    }

    pub fn prompt_override(&self) -> Option<&str> {
        self.prompt_override.as_deref()
    }
}

/// Pending input text plus the current input mode.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    text: String,
    mode: InputMode,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replace the input with a voice transcript.
    pub fn apply_transcript(&mut self, transcript: &str) {
        self.text = transcript.trim().to_string();
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Switch between text and image mode, returning the new mode.
    pub fn toggle_mode(&mut self) -> InputMode {
        self.mode = match self.mode {
            InputMode::Text => InputMode::Image,
            InputMode::Image => InputMode::Text,
        };
        self.mode
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Take the input for sending, leaving the composer empty.
    ///
    /// Blank input is left in place and yields `None`.
    pub fn take_submission(&mut self) -> Option<Submission> {
        if self.is_blank() {
            return None;
        }
        let content = std::mem::take(&mut self.text).trim().to_string();
        let prompt_override = match self.mode {
            InputMode::Text => None,
            InputMode::Image => Some(Directive::image_prompt(&content)),
        };
        Some(Submission {
            content,
            prompt_override,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_yields_nothing() {
        let mut composer = Composer::new();
        assert!(composer.take_submission().is_none());
        composer.set_text("   \n\t");
        assert!(composer.take_submission().is_none());
    }

    #[test]
    fn test_text_submission_clears_input() {
        let mut composer = Composer::new();
        composer.set_text(" Hello ");
        let submission = composer.take_submission().unwrap();
        assert_eq!(submission, Submission::text("Hello"));
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn test_image_mode_sets_override() {
        let mut composer = Composer::new();
        assert_eq!(composer.toggle_mode(), InputMode::Image);
        composer.set_text("a cat ");
        let submission = composer.take_submission().unwrap();
        assert_eq!(submission.content, "a cat");
        assert_eq!(submission.prompt_override(), Some("/imagine a cat"));
        assert_eq!(composer.mode(), InputMode::Image);
    }

    #[test]
    fn test_transcript_replaces_text() {
        let mut composer = Composer::new();
        composer.set_text("draft");
        composer.apply_transcript(" what is the weather \n");
        assert_eq!(composer.text(), "what is the weather");
    }

    #[test]
    fn test_toggle_back_to_text() {
        let mut composer = Composer::new();
        composer.toggle_mode();
        assert_eq!(composer.toggle_mode(), InputMode::Text);
        assert_eq!(InputMode::Image.to_string(), "Image");
    }
}
