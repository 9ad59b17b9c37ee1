//! Signal conditioning for Whisper: downmix, resample, energy VAD and
//! utterance endpointing.
//!
//! Whisper wants 16 kHz mono `f32`.  Microphones usually deliver 44.1 or
//! 48 kHz, often stereo, so every captured chunk goes through
//! [`to_mono`] then [`resample_to_16k`] before it reaches the
//! [`Endpointer`].

/// Sample rate Whisper expects.
pub const WHISPER_RATE: u32 = 16_000;

/// 30 ms at 16 kHz.
const FRAME: usize = 480;

/// Average interleaved channels into one.
///
/// ```
/// use eigo_drill::speech::signal::to_mono;
///
/// assert_eq!(to_mono(&[0.5, 0.25, 1.0, 0.0], 2), vec![0.375, 0.5]);
/// ```
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let n = channels as usize;
    match n {
        0 => Vec::new(),
        1 => samples.to_vec(),
        _ => samples
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

/// Linear-interpolation resampler to [`WHISPER_RATE`].
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == WHISPER_RATE || source_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let step = source_rate as f64 / WHISPER_RATE as f64;
    let out_len = (samples.len() as f64 / step).ceil() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

/// RMS of a frame; `0.0` for an empty frame.
fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

// ---------------------------------------------------------------------------
// EnergyVad
// ---------------------------------------------------------------------------

/// Frame-wise RMS voice detector for 16 kHz mono audio.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn is_voice(&self, frame: &[f32]) -> bool {
        rms(frame) > self.threshold
    }

    /// Cut leading and trailing silent frames.  All-silent input yields an
    /// empty slice.
    pub fn trim<'a>(&self, audio: &'a [f32]) -> &'a [f32] {
        let frames: Vec<(usize, &[f32])> = audio
            .chunks(FRAME)
            .enumerate()
            .map(|(i, f)| (i * FRAME, f))
            .collect();

        let first = frames.iter().find(|(_, f)| self.is_voice(f));
        let last = frames.iter().rev().find(|(_, f)| self.is_voice(f));

        match (first, last) {
            (Some((start, _)), Some((end, frame))) => &audio[*start..end + frame.len()],
            _ => &audio[..0],
        }
    }
}

// ---------------------------------------------------------------------------
// Endpointer
// ---------------------------------------------------------------------------

/// Whether capture should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Listening,
    /// Speech was followed by enough silence.
    SpeechEnded,
    /// The length cap was hit.
    MaxDuration,
}

/// Decides when a single utterance is over from a stream of 16 kHz chunks.
#[derive(Debug)]
pub struct Endpointer {
    vad: EnergyVad,
    trailing_silence: usize,
    max_samples: usize,
    heard_voice: bool,
    silence_run: usize,
    total: usize,
}

impl Endpointer {
    pub fn new(vad: EnergyVad, trailing_silence_secs: f32, max_secs: f32) -> Self {
        let to_samples = |secs: f32| (secs.max(0.0) * WHISPER_RATE as f32) as usize;
        Self {
            vad,
            trailing_silence: to_samples(trailing_silence_secs).max(1),
            max_samples: to_samples(max_secs).max(1),
            heard_voice: false,
            silence_run: 0,
            total: 0,
        }
    }

    pub fn heard_voice(&self) -> bool {
        self.heard_voice
    }

    pub fn push(&mut self, chunk: &[f32]) -> Endpoint {
        for frame in chunk.chunks(FRAME) {
            self.total += frame.len();
            if self.vad.is_voice(frame) {
                self.heard_voice = true;
                self.silence_run = 0;
            } else if self.heard_voice {
                self.silence_run += frame.len();
            }

            if self.heard_voice && self.silence_run >= self.trailing_silence {
                return Endpoint::SpeechEnded;
            }
            if self.total >= self.max_samples {
                return Endpoint::MaxDuration;
            }
        }
        Endpoint::Listening
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(silent_pre: usize, voice: usize, silent_post: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; silent_pre];
        v.extend(vec![0.3_f32; voice]);
        v.extend(vec![0.0_f32; silent_post]);
        v
    }

    #[test]
    fn mono_passthrough_and_zero_channels() {
        assert_eq!(to_mono(&[0.1, 0.2], 1), vec![0.1, 0.2]);
        assert!(to_mono(&[0.1, 0.2], 0).is_empty());
    }

    #[test]
    fn resample_lengths() {
        assert_eq!(resample_to_16k(&vec![0.0; 480], 48_000).len(), 160);
        assert_eq!(resample_to_16k(&vec![0.0; 80], 8_000).len(), 160);
        assert_eq!(resample_to_16k(&vec![0.0; 160], 16_000).len(), 160);
        let n = resample_to_16k(&vec![0.0; 44_100], 44_100).len();
        assert!(n.abs_diff(16_000) <= 1, "got {n}");
    }

    #[test]
    fn resample_keeps_dc_level() {
        let out = resample_to_16k(&vec![0.25; 441], 44_100);
        assert!(out.iter().all(|s| (s - 0.25).abs() < 1e-5));
    }

    #[test]
    fn trim_keeps_only_voiced_frames() {
        let vad = EnergyVad::new(0.01);
        assert_eq!(vad.trim(&signal(960, 480, 960)).len(), 480);
        assert!(vad.trim(&vec![0.0; 1_440]).is_empty());
        assert!(vad.trim(&[]).is_empty());
    }

    #[test]
    fn endpointer_waits_for_trailing_silence_after_speech() {
        let mut ep = Endpointer::new(EnergyVad::new(0.01), 0.5, 10.0);

        // Leading silence never ends the utterance.
        assert_eq!(ep.push(&vec![0.0; 16_000]), Endpoint::Listening);
        assert!(!ep.heard_voice());

        assert_eq!(ep.push(&vec![0.3; 8_000]), Endpoint::Listening);
        assert_eq!(ep.push(&vec![0.0; 4_800]), Endpoint::Listening);
        assert_eq!(ep.push(&vec![0.0; 4_800]), Endpoint::SpeechEnded);
    }

    #[test]
    fn endpointer_caps_duration() {
        let mut ep = Endpointer::new(EnergyVad::new(0.01), 1.0, 1.0);
        assert_eq!(ep.push(&vec![0.3; 15_840]), Endpoint::Listening);
        assert_eq!(ep.push(&vec![0.3; 480]), Endpoint::MaxDuration);
    }
}
