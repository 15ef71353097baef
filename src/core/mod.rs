//! Core framework-level components
//!
//! - `error`: Structured error handling with stable codes and error classes

pub mod error;

pub use error::{
    AudioOperation, ErrorClass, ResourceKind, Result, ResultExt, StoreOperation, TtsError,
    ValidationReason,
};
