//! Audio capture from microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// The finalized, opaque binary encoding of one captured utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Encoded audio bytes
    pub data: Vec<u8>,

    /// Container MIME type
    pub mime: &'static str,
}

/// One microphone capture session
///
/// Exactly one `begin`/`finish` pair per session; sessions are not reusable.
/// The hardware stream is released when the session is finished or dropped,
/// whichever comes first.
pub struct CaptureSession {
    stream: Stream,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl CaptureSession {
    /// Acquire the microphone and start capturing
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaptureUnavailable`] if no input device exists, the
    /// device rejects the capture format, or the stream cannot start
    /// (typically a permission problem).
    pub fn begin() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::CaptureUnavailable("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::CaptureUnavailable(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| {
                Error::CaptureUnavailable("no mono 16kHz capture config found".to_string())
            })?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let chunk_sink = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = chunk_sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::CaptureUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::CaptureUnavailable(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "capture session started"
        );

        Ok(Self { stream, buffer })
    }

    /// Stop capturing, release the microphone, and finalize the artifact
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn finish(self) -> Result<AudioArtifact> {
        drop(self.stream);

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        tracing::debug!(samples = samples.len(), "capture session finished");

        let data = samples_to_wav(&samples, SAMPLE_RATE)?;
        Ok(AudioArtifact {
            data,
            mime: "audio/wav",
        })
    }
}

/// Convert f32 samples to WAV bytes for voice submission
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
