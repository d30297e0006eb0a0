//! Error Taxonomy
//!
//! The core never panics and never throws on the audio path. This enum
//! exists only for the control/FFI boundary (building `Response`
//! messages); `ConfigInvalid` and `DegenerateBlock` are deliberately NOT
//! variants here — both are silently-handled conditions (clamp, no-op),
//! not failures, and giving them an error type would invite callers to
//! treat routine input as exceptional.

use thiserror::Error;

/// Errors surfaced at the control/FFI boundary. Never propagated through
/// the audio-thread `process` call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A command was issued before a processor handle was allocated.
    #[error("processor not initialized")]
    Uninitialized,

    /// An FFI `cmd_type` byte fell outside the enumerated `CommandType`
    /// range.
    #[error("unknown command type: {0}")]
    UnknownCommand(u8),

    /// A wire-format payload was truncated or otherwise malformed.
    #[error("malformed command payload: {0}")]
    Decode(&'static str),
}
