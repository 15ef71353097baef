//! WAV container encoding and decoding
//!
//! Every artifact leaves the engine layer as canonical RIFF/WAVE PCM:
//! 16-bit signed little-endian samples at the artifact's own sample rate.
//! Decoding accepts other PCM layouts produced by external synthesizers
//! and folds them down to the same 16-bit mono representation.

use std::io::Cursor;

use crate::core::error::{AudioOperation, Result, TtsError};

/// Bit depth of every WAV produced by this crate
pub const BITS_PER_SAMPLE: u16 = 16;

/// Raw decoded audio as produced by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Interleaved 16-bit PCM samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (engines produce mono)
    pub channels: u16,
}

impl AudioArtifact {
    /// Mono artifact from 16-bit samples
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Mono artifact from normalized float samples in [-1, 1]
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        let samples = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Silent mono artifact of the given length
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        let len = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        Self::new(vec![0; len], sample_rate)
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// Encode an artifact into an in-memory WAV byte sequence
pub fn encode_wav(artifact: &AudioArtifact) -> Result<Vec<u8>> {
    if artifact.sample_rate == 0 || artifact.channels == 0 {
        return Err(TtsError::Audio {
            message: format!(
                "Invalid audio layout: {} Hz, {} channel(s)",
                artifact.sample_rate, artifact.channels
            ),
            operation: AudioOperation::Encoding,
        });
    }

    let capacity = 44 + artifact.samples.len() * 2;
    let mut cursor = Cursor::new(Vec::with_capacity(capacity));
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, artifact.spec()).map_err(encoding_error)?;
        let mut samples = writer.get_i16_writer(artifact.samples.len() as u32);
        for &sample in &artifact.samples {
            samples.write_sample(sample);
        }
        samples.flush().map_err(encoding_error)?;
        writer.finalize().map_err(encoding_error)?;
    }

    Ok(cursor.into_inner())
}

/// Decode a WAV byte sequence into a mono 16-bit artifact
pub fn decode_wav(bytes: &[u8]) -> Result<AudioArtifact> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Int, bits) if bits <= 32 => {
            let samples = reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()?;
            samples
                .into_iter()
                .map(|s| rescale_int(s, bits))
                .collect()
        }
        (hound::SampleFormat::Float, 32) => {
            let samples = reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?;
            samples
                .into_iter()
                .map(|s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                .collect()
        }
        (format, bits) => {
            return Err(TtsError::Audio {
                message: format!("Unsupported WAV layout: {:?} {}-bit", format, bits),
                operation: AudioOperation::Decoding,
            })
        }
    };

    let samples = if spec.channels > 1 {
        downmix(&interleaved, spec.channels as usize)
    } else {
        interleaved
    };

    Ok(AudioArtifact::new(samples, spec.sample_rate))
}

fn rescale_int(sample: i32, bits: u16) -> i16 {
    if bits > 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}

fn downmix(interleaved: &[i16], channels: usize) -> Vec<i16> {
    interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn encoding_error(err: hound::Error) -> TtsError {
    TtsError::Audio {
        message: err.to_string(),
        operation: AudioOperation::Encoding,
    }
}
