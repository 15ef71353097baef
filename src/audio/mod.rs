//! Audio container handling
//!
//! - In-memory audio artifacts (16-bit PCM + sample rate)
//! - WAV encoding for responses and history storage
//! - WAV decoding of external synthesizer output

mod wav;

pub use wav::{decode_wav, encode_wav, AudioArtifact, BITS_PER_SAMPLE};
