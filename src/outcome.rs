//! Uniform envelope the operations can be flattened into at an application
//! boundary. Hosts that cannot consume `Result` directly (an RPC handler, a
//! text protocol, a scripted test driver) branch on `ok`, show `message` on
//! failure and unwrap `payload` on success.

use crate::db::error::{LibraryError, LibraryResult};

/// Tri-part result envelope: success flag, human-readable failure message and
/// an optional payload for read operations. The message is always present and
/// descriptive when `ok` is false.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub ok: bool,
    pub message: Option<String>,
    pub payload: Option<T>,
}

impl<T> Outcome<T> {
    /// Successful envelope carrying a payload.
    pub fn succeeded(payload: T) -> Self {
        Self {
            ok: true,
            message: None,
            payload: Some(payload),
        }
    }

    /// Successful envelope for write operations that return nothing.
    pub fn done() -> Self {
        Self {
            ok: true,
            message: None,
            payload: None,
        }
    }

    /// Failed envelope with the error rendered into the message slot.
    pub fn failed(err: &LibraryError) -> Self {
        Self {
            ok: false,
            message: Some(err.to_string()),
            payload: None,
        }
    }
}

impl<T> From<LibraryResult<T>> for Outcome<T> {
    fn from(result: LibraryResult<T>) -> Self {
        match result {
            Ok(payload) => Self::succeeded(payload),
            Err(err) => Self::failed(&err),
        }
    }
}
