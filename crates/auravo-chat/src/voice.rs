//! Voice input: record, then transcribe.
//!
//! Two states:
//! - Idle -> Recording (capture resource acquired)
//! - Recording -> Idle (recording finalized, or cancelled)

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use auravo_core::config::VoiceConfig;
use auravo_core::DataUri;
use auravo_gateway::{ModelGateway, TranscriptionRequest};
use tracing::{debug, info, warn};

use crate::error::CaptureError;

/// A transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn microphone_error() -> Self {
        Self::new(
            "Microphone Error",
            "Could not access the microphone. Please check your permissions.",
        )
    }

    pub fn processing_failed() -> Self {
        Self::new("Error", "Failed to process audio. Please try again.")
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Finalized audio from a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub bytes: Vec<u8>,
    /// Container type, when the recorder knows it.
    pub mime_type: Option<String>,
}

/// An acquired capture resource.
pub trait CaptureSession: Send {
    /// Stop capturing and return everything recorded.
    fn finish(self: Box<Self>) -> Result<Recording, CaptureError>;
}

/// Source of capture sessions.
pub trait AudioRecorder: Send + Sync {
    /// Acquire the capture resource. Fails with
    /// [`CaptureError::Microphone`] when access is denied.
    fn open(&self) -> Result<Box<dyn CaptureSession>, CaptureError>;
}

/// Recorder that "records" by reading an existing audio file.
///
/// Live capture is [`MicrophoneRecorder`](crate::MicrophoneRecorder).
#[derive(Debug, Clone)]
pub struct FileRecorder {
    path: PathBuf,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AudioRecorder for FileRecorder {
    fn open(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => Ok(Box::new(FileSession {
                path: self.path.clone(),
            })),
            Ok(_) => Err(CaptureError::Microphone(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(e) => Err(CaptureError::Microphone(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

struct FileSession {
    path: PathBuf,
}

impl CaptureSession for FileSession {
    fn finish(self: Box<Self>) -> Result<Recording, CaptureError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| CaptureError::Recorder(format!("{}: {}", self.path.display(), e)))?;
        Ok(Recording {
            bytes,
            mime_type: mime_for_extension(&self.path).map(str::to_string),
        })
    }
}

fn mime_for_extension(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "webm" => Some("audio/webm"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "m4a" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}

/// Operational state of voice capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceState {
    Idle,
    Recording,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Recording => write!(f, "Recording"),
        }
    }
}

/// Voice capture state machine.
///
/// At most one session is active. The session is owned by the `Recording`
/// state, so a failed `start` never disturbs a recording in progress.
pub struct VoiceCapture {
    recorder: Box<dyn AudioRecorder>,
    gateway: Arc<dyn ModelGateway>,
    session: Option<Box<dyn CaptureSession>>,
    mime_type: String,
    max_bytes: usize,
}

impl VoiceCapture {
    pub fn new(
        recorder: Box<dyn AudioRecorder>,
        gateway: Arc<dyn ModelGateway>,
        config: &VoiceConfig,
    ) -> Self {
        Self {
            recorder,
            gateway,
            session: None,
            mime_type: config.mime_type.clone(),
            max_bytes: config.max_recording_bytes,
        }
    }

    pub fn state(&self) -> VoiceState {
        if self.session.is_some() {
            VoiceState::Recording
        } else {
            VoiceState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Idle -> Recording.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        match self.recorder.open() {
            Ok(session) => {
                debug!("Voice state: {} -> {}", VoiceState::Idle, VoiceState::Recording);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not start recording");
                Err(e)
            }
        }
    }

    /// Recording -> Idle, returning the transcript of the recording.
    ///
    /// The state is Idle afterwards whether or not transcription succeeded.
    pub async fn stop(&mut self) -> Result<String, CaptureError> {
        let session = self.session.take().ok_or(CaptureError::NotRecording)?;
        debug!("Voice state: {} -> {}", VoiceState::Recording, VoiceState::Idle);

        let result = self.transcribe(session).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Failed to process audio");
        }
        result
    }

    /// Drop the active session without transcribing.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.session.take().is_some();
        if cancelled {
            debug!("Voice recording cancelled");
        }
        cancelled
    }

    async fn transcribe(&self, session: Box<dyn CaptureSession>) -> Result<String, CaptureError> {
        let recording = session.finish()?;
        if recording.bytes.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }
        if recording.bytes.len() > self.max_bytes {
            return Err(CaptureError::TooLarge {
                size: recording.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let mime_type = recording.mime_type.as_deref().unwrap_or(&self.mime_type);
        let audio = DataUri::from_bytes(mime_type, &recording.bytes);
        let transcript = self
            .gateway
            .transcribe_audio(TranscriptionRequest::new(audio))
            .await?
            .transcript;
        info!(
            bytes = recording.bytes.len(),
            mime_type = %mime_type,
            transcript_len = transcript.len(),
            "Recording transcribed"
        );
        Ok(transcript)
    }
}

impl fmt::Debug for VoiceCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceCapture")
            .field("state", &self.state())
            .field("mime_type", &self.mime_type)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use auravo_gateway::{GatewayCall, MockGateway};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Recorder with a fixed outcome that counts how often it was opened.
    struct ScriptedRecorder {
        bytes: Option<Vec<u8>>,
        opened: Arc<AtomicUsize>,
    }

    struct ScriptedSession(Vec<u8>);

    impl CaptureSession for ScriptedSession {
        fn finish(self: Box<Self>) -> Result<Recording, CaptureError> {
            Ok(Recording {
                bytes: self.0,
                mime_type: None,
            })
        }
    }

    impl AudioRecorder for ScriptedRecorder {
        fn open(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            match &self.bytes {
                Some(bytes) => Ok(Box::new(ScriptedSession(bytes.clone()))),
                None => Err(CaptureError::Microphone("permission denied".to_string())),
            }
        }
    }

    fn capture(bytes: Option<&[u8]>, gateway: MockGateway) -> (VoiceCapture, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let recorder = ScriptedRecorder {
            bytes: bytes.map(<[u8]>::to_vec),
            opened: Arc::clone(&opened),
        };
        let capture = VoiceCapture::new(
            Box::new(recorder),
            Arc::new(gateway),
            &VoiceConfig::default(),
        );
        (capture, opened)
    }

    #[test]
    fn test_state_display() {
        assert_eq!(VoiceState::Idle.to_string(), "Idle");
        assert_eq!(VoiceState::Recording.to_string(), "Recording");
    }

    #[tokio::test]
    async fn test_record_and_transcribe() {
        let gateway = MockGateway::new().with_transcript("hello there");
        let (mut voice, _) = capture(Some(b"\x1a\x45\xdf\xa3"), gateway);
        voice.start().unwrap();
        assert_eq!(voice.state(), VoiceState::Recording);

        let transcript = voice.stop().await.unwrap();
        assert_eq!(transcript, "hello there");
        assert_eq!(voice.state(), VoiceState::Idle);
    }

    #[tokio::test]
    async fn test_default_mime_type_used() {
        let gateway = Arc::new(MockGateway::new());
        let opened = Arc::new(AtomicUsize::new(0));
        let recorder = ScriptedRecorder {
            bytes: Some(b"abc".to_vec()),
            opened,
        };
        let mut voice = VoiceCapture::new(
            Box::new(recorder),
            Arc::clone(&gateway) as Arc<dyn ModelGateway>,
            &VoiceConfig::default(),
        );
        voice.start().unwrap();
        voice.stop().await.unwrap();
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::TranscribeAudio {
                mime_type: "audio/webm".to_string()
            }]
        );
    }

    #[test]
    fn test_start_while_recording_is_rejected() {
        let (mut voice, opened) = capture(Some(b"abc"), MockGateway::new());
        voice.start().unwrap();
        let err = voice.start().unwrap_err();
        assert!(matches!(err, CaptureError::AlreadyRecording));
        assert_eq!(voice.state(), VoiceState::Recording);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permission_denied_stays_idle_with_notice() {
        let (mut voice, _) = capture(None, MockGateway::new());
        let err = voice.start().unwrap_err();
        assert_eq!(voice.state(), VoiceState::Idle);
        assert_eq!(err.notice(), Some(Notice::microphone_error()));
    }

    #[tokio::test]
    async fn test_stop_while_idle() {
        let (mut voice, _) = capture(Some(b"abc"), MockGateway::new());
        assert!(matches!(voice.stop().await, Err(CaptureError::NotRecording)));
    }

    #[tokio::test]
    async fn test_transcription_failure_returns_to_idle() {
        let gateway = MockGateway::new().failing_transcription("no speech");
        let (mut voice, _) = capture(Some(b"abc"), gateway);
        voice.start().unwrap();
        let err = voice.stop().await.unwrap_err();
        assert_eq!(voice.state(), VoiceState::Idle);
        assert_eq!(err.notice(), Some(Notice::processing_failed()));
        voice.start().unwrap();
    }

    #[tokio::test]
    async fn test_empty_recording() {
        let (mut voice, _) = capture(Some(b""), MockGateway::new());
        voice.start().unwrap();
        assert!(matches!(voice.stop().await, Err(CaptureError::EmptyRecording)));
    }

    #[tokio::test]
    async fn test_oversized_recording() {
        let opened = Arc::new(AtomicUsize::new(0));
        let recorder = ScriptedRecorder {
            bytes: Some(vec![0u8; 16]),
            opened,
        };
        let config = VoiceConfig {
            max_recording_bytes: 8,
            ..VoiceConfig::default()
        };
        let mut voice =
            VoiceCapture::new(Box::new(recorder), Arc::new(MockGateway::new()), &config);
        voice.start().unwrap();
        assert!(matches!(
            voice.stop().await,
            Err(CaptureError::TooLarge { size: 16, limit: 8 })
        ));
    }

    #[test]
    fn test_cancel() {
        let (mut voice, _) = capture(Some(b"abc"), MockGateway::new());
        assert!(!voice.cancel());
        voice.start().unwrap();
        assert!(voice.cancel());
        assert_eq!(voice.state(), VoiceState::Idle);
    }

    #[tokio::test]
    async fn test_file_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.wav");
        std::fs::write(&path, b"RIFF....WAVE").unwrap();

        let gateway = Arc::new(MockGateway::new());
        let mut voice = VoiceCapture::new(
            Box::new(FileRecorder::new(&path)),
            Arc::clone(&gateway) as Arc<dyn ModelGateway>,
            &VoiceConfig::default(),
        );
        voice.start().unwrap();
        assert_eq!(voice.stop().await.unwrap(), "[mock transcription]");
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::TranscribeAudio {
                mime_type: "audio/wav".to_string()
            }]
        );
    }

    #[test]
    fn test_file_recorder_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRecorder::new(dir.path().join("missing.webm"));
        assert!(matches!(recorder.open(), Err(CaptureError::Microphone(_))));

        let recorder = FileRecorder::new(dir.path());
        assert!(matches!(recorder.open(), Err(CaptureError::Microphone(_))));
    }
}
