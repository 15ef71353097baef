//! Procedural harmonic voice synthesis
//!
//! Renders a voiced-sounding tone per request: three harmonics of a
//! voice-specific base pitch plus a little noise, shaped by an
//! attack/decay envelope and peak-normalized.

use std::collections::HashMap;
use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::AudioArtifact;
use crate::core::error::{Result, TtsError};
use crate::engine::traits::SynthesisBackend;

/// Seconds of audio per input character
pub const SECS_PER_CHAR: f32 = 0.08;
/// Pitch for voices missing from the pitch table
pub const DEFAULT_PITCH_HZ: f32 = 180.0;

const HARMONICS: [(f32, f32); 3] = [(1.0, 0.3), (1.5, 0.2), (2.0, 0.1)];
const NOISE_LEVEL: f32 = 0.05;
const PEAK: f32 = 0.8;

/// Tone generator with a per-voice pitch table
pub struct ToneBackend {
    sample_rate: u32,
    pitches: HashMap<String, f32>,
    seed: Option<u64>,
}

impl ToneBackend {
    pub fn new(sample_rate: u32, pitches: &[(&str, f32)]) -> Self {
        Self {
            sample_rate,
            pitches: pitches
                .iter()
                .map(|(id, hz)| (id.to_string(), *hz))
                .collect(),
            seed: None,
        }
    }

    /// Make noise reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn pitch(&self, voice_id: &str) -> f32 {
        self.pitches
            .get(voice_id)
            .copied()
            .unwrap_or(DEFAULT_PITCH_HZ)
    }

    fn render(&self, text: &str, pitch: f32) -> Vec<f32> {
        let duration = text.chars().count() as f32 * SECS_PER_CHAR;
        let len = (duration * self.sample_rate as f32) as usize;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let rate = self.sample_rate as f32;
        let mut samples: Vec<f32> = (0..len)
            .map(|i| {
                let t = i as f32 / rate;
                let voiced: f32 = HARMONICS
                    .iter()
                    .map(|(mult, amp)| amp * (2.0 * PI * pitch * mult * t).sin())
                    .sum();
                let noise = NOISE_LEVEL * gaussian(&mut rng);
                let envelope = (-0.5 * t).exp() * (1.0 - (-10.0 * t).exp());
                (voiced + noise) * envelope
            })
            .collect();

        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak > 0.0 {
            let gain = PEAK / peak;
            for s in &mut samples {
                *s *= gain;
            }
        }
        samples
    }
}

impl SynthesisBackend for ToneBackend {
    fn name(&self) -> &str {
        "tone"
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact> {
        if self.sample_rate == 0 {
            return Err(TtsError::Config {
                message: "tone backend sample rate must be positive".to_string(),
                path: None,
            });
        }
        let samples = self.render(text, self.pitch(voice_id));
        Ok(AudioArtifact::from_f32(&samples, self.sample_rate))
    }
}

// Box-Muller
fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
