//! Hook registry error types.

use super::HookId;
use thiserror::Error;

/// Errors returned while declaring hook points or attaching handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("hook {0} is already declared")]
    Duplicate(HookId),

    #[error("unknown hook {0}")]
    Unknown(HookId),

    #[error("signature `{0}` is not a callback")]
    InvalidSignature(&'static str),

    #[error("handler `{given}` does not match the signature `{wanted}` of hook {id}")]
    SignatureMismatch {
        id: HookId,
        given: &'static str,
        wanted: &'static str,
    },
}
