//! Voice Module
//!
//! - Voice descriptors and per-engine catalogs
//! - Normalization of raw voice specs (names, gender tags, descriptions)
//! - Built-in voice tables for the shipped engines

pub mod catalog;
pub mod presets;

pub use catalog::{
    display_name_from_id, Gender, VoiceCatalog, VoiceDescriptor, VoiceSpec,
    DEFAULT_VOICE_DESCRIPTION,
};
