//! Conversational core of Auravo.
//!
//! The [`ConversationController`] turns submissions into conversation
//! mutations and gateway calls. Input capture (the text composer, the voice
//! state machine with its recorders, the typewriter reveal) lives alongside
//! it.

pub mod composer;
pub mod controller;
pub mod directive;
pub mod error;
pub mod microphone;
pub mod title;
pub mod typewriter;
pub mod voice;

pub use composer::{Composer, InputMode, Submission};
pub use controller::{ConversationController, SendOutcome, FALLBACK_MESSAGE};
pub use directive::{Directive, IMAGE_DIRECTIVE};
pub use error::{CaptureError, ChatError};
pub use microphone::MicrophoneRecorder;
pub use title::needs_title;
pub use typewriter::Typewriter;
pub use voice::{
    AudioRecorder, CaptureSession, FileRecorder, Notice, Recording, VoiceCapture, VoiceState,
};
