//! Microphone capture via cpal.
//!
//! The cpal stream is owned by a dedicated thread for the lifetime of a
//! session; finishing (or dropping) the session stops that thread, which
//! drops the stream. Samples are downmixed to mono in the callback and
//! encoded as 16-bit PCM WAV when the session finishes.
//!
//! Builds without the `microphone` feature fail every `open` with
//! [`CaptureError::Microphone`].

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use auravo_core::config::VoiceConfig;

use crate::error::CaptureError;
use crate::voice::{AudioRecorder, CaptureSession, Recording};

/// Mime type of recordings produced by [`MicrophoneRecorder`].
pub const WAV_MIME: &str = "audio/wav";

/// Size of a canonical WAV header.
const WAV_HEADER_BYTES: usize = 44;

/// Mono samples shared with the capture callback.
///
/// Samples past `max_samples` are discarded; the recording is then one sample
/// over the byte limit and gets rejected as too large.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
struct SampleBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
    max_samples: usize,
}

#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
impl SampleBuffer {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
            max_samples,
        }
    }

    fn push(&self, data: &[f32]) {
        if let Ok(mut buf) = self.samples.lock() {
            let room = self.max_samples.saturating_sub(buf.len());
            buf.extend_from_slice(&data[..data.len().min(room)]);
        }
    }

    fn take(&self) -> Vec<f32> {
        match self.samples.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    }
}

/// Average interleaved frames down to one channel.
#[cfg_attr(not(feature = "microphone"), allow(dead_code))]
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Encode mono samples in `[-1.0, 1.0]` as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_BYTES + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| CaptureError::Recorder(format!("failed to create wav writer: {}", e)))?;
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer
            .write_sample(v)
            .map_err(|e| CaptureError::Recorder(format!("failed to write wav sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::Recorder(format!("failed to finalize wav: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Turn captured samples into a recording. No samples means no bytes, which
/// is reported as an empty recording.
fn into_recording(samples: Vec<f32>, sample_rate: u32) -> Result<Recording, CaptureError> {
    let bytes = if samples.is_empty() {
        Vec::new()
    } else {
        encode_wav(&samples, sample_rate)?
    };
    Ok(Recording {
        bytes,
        mime_type: Some(WAV_MIME.to_string()),
    })
}

/// Recorder backed by an input device.
#[derive(Debug, Clone)]
pub struct MicrophoneRecorder {
    device_name: String,
    #[cfg_attr(not(feature = "microphone"), allow(dead_code))]
    max_samples: usize,
}

impl MicrophoneRecorder {
    pub fn new(config: &VoiceConfig) -> Self {
        let max_bytes = config.max_recording_bytes.saturating_sub(WAV_HEADER_BYTES);
        Self {
            device_name: config.device_name.clone(),
            max_samples: max_bytes / 2 + 1,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

#[cfg(feature = "microphone")]
impl AudioRecorder for MicrophoneRecorder {
    fn open(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        let session = device::open(&self.device_name, SampleBuffer::new(self.max_samples))?;
        Ok(Box::new(session))
    }
}

#[cfg(not(feature = "microphone"))]
impl AudioRecorder for MicrophoneRecorder {
    fn open(&self) -> Result<Box<dyn CaptureSession>, CaptureError> {
        tracing::warn!("Microphone capture requested in a build without the microphone feature");
        Err(CaptureError::Microphone(
            "this build has no microphone support".to_string(),
        ))
    }
}

// =============================================================================
// cpal backend
// =============================================================================

#[cfg(feature = "microphone")]
mod device {
    use std::sync::mpsc;
    use std::thread::JoinHandle;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{debug, error, info};

    use super::{downmix, into_recording, SampleBuffer};
    use crate::error::CaptureError;
    use crate::voice::{CaptureSession, Recording};

    pub(super) struct MicrophoneSession {
        buffer: SampleBuffer,
        sample_rate: u32,
        stop: mpsc::Sender<()>,
        thread: JoinHandle<()>,
    }

    impl CaptureSession for MicrophoneSession {
        fn finish(self: Box<Self>) -> Result<Recording, CaptureError> {
            let MicrophoneSession {
                buffer,
                sample_rate,
                stop,
                thread,
            } = *self;
            let _ = stop.send(());
            if thread.join().is_err() {
                return Err(CaptureError::Recorder("capture thread panicked".to_string()));
            }
            into_recording(buffer.take(), sample_rate)
        }
    }

    /// Start capturing on a new thread and wait until the stream is playing.
    pub(super) fn open(
        device_name: &str,
        buffer: SampleBuffer,
    ) -> Result<MicrophoneSession, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let name = device_name.to_string();
        let callback_buffer = buffer.clone();

        let thread = std::thread::Builder::new()
            .name("auravo-microphone".to_string())
            .spawn(move || {
                let stream = match start_stream(&name, callback_buffer) {
                    Ok((stream, sample_rate)) => {
                        let _ = ready_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Returns on finish, or with Err once the session is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                debug!("Microphone stream closed");
            })
            .map_err(|e| {
                CaptureError::Microphone(format!("failed to spawn capture thread: {}", e))
            })?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| CaptureError::Microphone("capture thread exited early".to_string()))??;
        Ok(MicrophoneSession {
            buffer,
            sample_rate,
            stop: stop_tx,
            thread,
        })
    }

    fn start_stream(
        device_name: &str,
        buffer: SampleBuffer,
    ) -> Result<(cpal::Stream, u32), CaptureError> {
        let host = cpal::default_host();
        let device = if device_name == "default" {
            host.default_input_device()
                .ok_or_else(|| CaptureError::Microphone("no default input device".to_string()))?
        } else {
            let wanted = device_name.to_lowercase();
            host.input_devices()
                .map_err(|e| {
                    CaptureError::Microphone(format!("failed to enumerate devices: {}", e))
                })?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&wanted))
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    CaptureError::Microphone(format!("input device '{}' not found", device_name))
                })?
        };
        let label = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Microphone(format!("{}: {}", label, e)))?;
        let config = supported.config();
        let channels = usize::from(config.channels);
        let on_error = |err: cpal::StreamError| error!("Microphone stream error: {}", err);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    buffer.push(&downmix(data, channels));
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let data: Vec<f32> = data
                        .iter()
                        .map(|&s| f32::from(s) / f32::from(i16::MAX))
                        .collect();
                    buffer.push(&downmix(&data, channels));
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::Microphone(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| CaptureError::Microphone(format!("failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| CaptureError::Microphone(format!("failed to start input stream: {}", e)))?;

        info!(
            device = %label,
            sample_rate = config.sample_rate.0,
            channels,
            "Microphone capture started"
        );
        Ok((stream, config.sample_rate.0))
    }
}
