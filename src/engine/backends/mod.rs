//! Blocking synthesis backends for local engines

pub mod command;
pub mod tone;

pub use command::{executable_in_path, CommandBackend};
pub use tone::ToneBackend;
