//! Voice catalog
//!
//! Each engine owns one catalog: an ordered, de-duplicated list of voice
//! descriptors built from raw voice specs. Order is the engine's own
//! (insertion order) and is never re-sorted here.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{ResourceKind, Result, TtsError};

/// Description used when a voice spec carries none
pub const DEFAULT_VOICE_DESCRIPTION: &str = "High quality voice";

/// Voice gender tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Gender {
    /// Parse a loose gender label (case-insensitive)
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "man" => Gender::Male,
            "female" | "f" | "woman" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }

    /// Infer gender from a `-f` / `-m` voice id suffix
    pub fn from_voice_id(id: &str) -> Self {
        let lower = id.to_ascii_lowercase();
        if lower.ends_with("-f") || lower.ends_with("_f") {
            Gender::Female
        } else if lower.ends_with("-m") || lower.ends_with("_m") {
            Gender::Male
        } else {
            Gender::Unspecified
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A normalized, immutable voice entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Voice id, unique within its engine
    pub id: String,
    /// Human-readable name
    #[serde(rename = "name")]
    pub display_name: String,
    /// Gender tag
    pub gender: Gender,
    /// Free-text description
    pub description: String,
}

/// Raw voice definition as shipped by an engine or written in config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VoiceSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Normalize into a descriptor; `None` if the id is blank
    pub fn normalize(&self) -> Option<VoiceDescriptor> {
        let id = self.id.trim();
        if id.is_empty() {
            return None;
        }

        let display_name = non_blank(self.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| display_name_from_id(id));

        let gender = match non_blank(self.gender.as_deref()) {
            Some(label) => Gender::parse(label),
            None => Gender::from_voice_id(id),
        };

        let description = non_blank(self.description.as_deref())
            .unwrap_or(DEFAULT_VOICE_DESCRIPTION)
            .to_string();

        Some(VoiceDescriptor {
            id: id.to_string(),
            display_name,
            gender,
            description,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Derive a display name from a voice id
///
/// `expr-voice-2-f` becomes `Voice 2 F`, `vctk-p225` becomes `Vctk P225`.
pub fn display_name_from_id(id: &str) -> String {
    let base = match id.strip_prefix("expr-voice-") {
        Some(rest) => format!("Voice {}", rest),
        None => id.to_string(),
    };

    base.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Ordered voice catalog of one engine
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
    index: HashMap<String, usize>,
}

impl VoiceCatalog {
    /// Build a catalog from raw specs
    ///
    /// Blank ids are dropped; for duplicate ids the first spec wins.
    pub fn from_specs<'a, I>(specs: I) -> Self
    where
        I: IntoIterator<Item = &'a VoiceSpec>,
    {
        let mut catalog = Self::default();
        for spec in specs {
            if let Some(voice) = spec.normalize() {
                catalog.push(voice);
            }
        }
        catalog
    }

    fn push(&mut self, voice: VoiceDescriptor) {
        if self.index.contains_key(&voice.id) {
            return;
        }
        self.index.insert(voice.id.clone(), self.voices.len());
        self.voices.push(voice);
    }

    /// Keep only the voices a backend reports as supported, in catalog order
    pub fn restrict_to(&self, supported: &[String]) -> Self {
        let mut catalog = Self::default();
        for voice in &self.voices {
            if supported.iter().any(|s| s.trim() == voice.id) {
                catalog.push(voice.clone());
            }
        }
        catalog
    }

    /// All voices in engine-defined order
    pub fn list(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn get(&self, voice_id: &str) -> Option<&VoiceDescriptor> {
        self.index.get(voice_id).map(|&i| &self.voices[i])
    }

    /// Look up a voice, failing with `NotFound` when absent
    pub fn voice(&self, voice_id: &str) -> Result<&VoiceDescriptor> {
        self.get(voice_id).ok_or_else(|| TtsError::NotFound {
            resource: ResourceKind::Voice,
            id: voice_id.to_string(),
        })
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.index.contains_key(voice_id)
    }

    /// Voice used when a request names none
    pub fn default_voice(&self) -> Option<&VoiceDescriptor> {
        self.voices.first()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
