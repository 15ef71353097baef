//! Built-in voice tables for the shipped engines

use super::catalog::VoiceSpec;

/// Kitten TTS expressive voices, in the order the model ships them
pub fn kitten_voices() -> Vec<VoiceSpec> {
    [
        ("expr-voice-2-f", "Clear, professional, great for narration"),
        ("expr-voice-2-m", "Solid, standard male voice. The reliable choice"),
        ("expr-voice-3-f", "A bit more expressive, good for character work"),
        ("expr-voice-3-m", "Deep, thoughtful. Perfect for storytelling"),
        ("expr-voice-4-f", "Upbeat and friendly. Your go-to for assistants"),
        ("expr-voice-4-m", "Energetic and clear. Gets the point across"),
        ("expr-voice-5-m", "The default. A bit... unique. Use with caution!"),
        ("expr-voice-5-f", "Expressive female voice"),
    ]
    .into_iter()
    .map(|(id, description)| VoiceSpec::new(id).with_description(description))
    .collect()
}

/// Coqui-style neural voices with their base pitch in Hz
pub const COQUI_VOICE_PITCH: &[(&str, f32)] = &[
    ("ljspeech", 220.0),
    ("vctk-p225", 200.0),
    ("vctk-p226", 150.0),
    ("vctk-p227", 140.0),
    ("jenny", 210.0),
    ("ryan", 160.0),
];

pub fn coqui_voices() -> Vec<VoiceSpec> {
    [
        ("ljspeech", "LJSpeech - Female", "female"),
        ("vctk-p225", "VCTK P225 - Female British", "female"),
        ("vctk-p226", "VCTK P226 - Male British", "male"),
        ("vctk-p227", "VCTK P227 - Male British", "male"),
        ("jenny", "Jenny - Neural Female", "female"),
        ("ryan", "Ryan - Neural Male", "male"),
    ]
    .into_iter()
    .map(|(id, name, gender)| VoiceSpec::new(id).with_name(name).with_gender(gender))
    .collect()
}

pub fn openai_voices() -> Vec<VoiceSpec> {
    [
        ("alloy", "Alloy - Balanced", "neutral"),
        ("echo", "Echo - Male", "male"),
        ("fable", "Fable - British Male", "male"),
        ("onyx", "Onyx - Deep Male", "male"),
        ("nova", "Nova - Female", "female"),
        ("shimmer", "Shimmer - Soft Female", "female"),
    ]
    .into_iter()
    .map(|(id, name, gender)| VoiceSpec::new(id).with_name(name).with_gender(gender))
    .collect()
}

/// Google voices: id, display name, BCP-47 language code, slow speech
pub const GOOGLE_VOICES: &[(&str, &str, &str, bool)] = &[
    ("en-us-standard", "English (US) - Standard", "en-US", false),
    ("en-us-slow", "English (US) - Slow", "en-US", true),
    ("en-uk-standard", "English (UK) - Standard", "en-GB", false),
    ("en-au-standard", "English (AU) - Standard", "en-AU", false),
    // no en-CA voices upstream
    ("en-ca-standard", "English (CA) - Standard", "en-US", false),
    ("en-in-standard", "English (IN) - Standard", "en-IN", false),
    ("zh-cn-standard", "Chinese (CN) - Standard", "cmn-CN", false),
    ("zh-tw-standard", "Chinese (TW) - Standard", "cmn-TW", false),
];

pub fn google_voices() -> Vec<VoiceSpec> {
    GOOGLE_VOICES
        .iter()
        .map(|(id, name, _, _)| VoiceSpec::new(*id).with_name(*name))
        .collect()
}

/// Azure neural voices; the language is the id prefix
pub fn azure_voices() -> Vec<VoiceSpec> {
    [
        ("en-US-AriaNeural", "Aria (US Female)", "female"),
        ("en-US-DavisNeural", "Davis (US Male)", "male"),
        ("en-US-JennyNeural", "Jenny (US Female)", "female"),
        ("en-US-GuyNeural", "Guy (US Male)", "male"),
        ("en-GB-SoniaNeural", "Sonia (UK Female)", "female"),
        ("en-GB-RyanNeural", "Ryan (UK Male)", "male"),
        ("zh-CN-XiaoxiaoNeural", "Xiaoxiao (CN Female)", "female"),
        ("zh-CN-YunxiNeural", "Yunxi (CN Male)", "male"),
    ]
    .into_iter()
    .map(|(id, name, gender)| VoiceSpec::new(id).with_name(name).with_gender(gender))
    .collect()
}
