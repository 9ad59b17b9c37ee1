//! Microphone capture via `cpal` for one utterance at a time.
//!
//! [`Microphone::open`] picks the default input device; [`record_utterance`]
//! streams from it until the [`Endpointer`] says the learner stopped
//! speaking, returning 16 kHz mono samples.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::config::SpeechConfig;

use super::signal::{resample_to_16k, to_mono, EnergyVad, Endpoint, Endpointer};
use super::SpeechError;

/// Raw interleaved samples from the device callback.
struct Chunk {
    samples: Vec<f32>,
}

/// The default input device and its native stream format.
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl Microphone {
    pub fn open() -> Result<Self, SpeechError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SpeechError::Unavailable("no input device".into()))?;

        let supported = device
            .default_input_config()
            .map_err(|e| SpeechError::Microphone(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();

        Ok(Self {
            device,
            config: supported.into(),
            sample_rate,
            channels,
        })
    }

    /// Start streaming; the returned stream stops when dropped.
    fn start(&self, tx: mpsc::Sender<Chunk>) -> Result<cpal::Stream, SpeechError> {
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Receiver gone means recording already finished.
                    let _ = tx.send(Chunk {
                        samples: data.to_vec(),
                    });
                },
                |err: cpal::StreamError| log::error!("speech: input stream error: {err}"),
                None,
            )
            .map_err(|e| SpeechError::Microphone(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SpeechError::Microphone(e.to_string()))?;
        Ok(stream)
    }
}

/// Record one utterance from the default microphone.
///
/// Blocks until speech is followed by `trailing_silence_secs` of silence or
/// `max_utterance_secs` elapse.
pub fn record_utterance(config: &SpeechConfig) -> Result<Vec<f32>, SpeechError> {
    let mic = Microphone::open()?;
    let (tx, rx) = mpsc::channel();
    let stream = mic.start(tx)?;

    let mut endpointer = Endpointer::new(
        EnergyVad::new(config.vad_threshold),
        config.trailing_silence_secs,
        config.max_utterance_secs,
    );
    let mut audio = Vec::new();
    // Wall-clock cap in case the device stops delivering chunks.
    let deadline = Instant::now() + Duration::from_secs_f32(config.max_utterance_secs.max(0.0) + 2.0);

    log::debug!(
        "speech: recording at {} Hz, {} ch",
        mic.sample_rate,
        mic.channels
    );

    let end = loop {
        if Instant::now() >= deadline {
            break Endpoint::MaxDuration;
        }
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                let mono = resample_to_16k(&to_mono(&chunk.samples, mic.channels), mic.sample_rate);
                let state = endpointer.push(&mono);
                audio.extend_from_slice(&mono);
                if state != Endpoint::Listening {
                    break state;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(SpeechError::Microphone("input stream closed".into()));
            }
        }
    };
    drop(stream);

    log::debug!(
        "speech: utterance ended ({end:?}) after {:.1}s",
        audio.len() as f32 / 16_000.0
    );

    if !endpointer.heard_voice() {
        return Err(SpeechError::NoSpeech);
    }
    Ok(audio)
}
