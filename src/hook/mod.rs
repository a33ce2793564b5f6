//! Typed extension points.
//!
//! A subsystem declares the hook points it fires together with the
//! callback signature they accept; other code attaches handlers during
//! startup and the subsystem fetches them in attach order when the
//! lifecycle event happens.
//!
//! ```text
//! declare(id, signature)  ── once, by the owner of the event
//! attach(id, handler)     ── any number of times, type-checked here
//! handlers::<F>(id)       ── at fire time, never fails
//! ```
//!
//! Signature checks happen at attach time so a misconfigured plugin fails
//! at startup instead of in the middle of a request.

mod error;
mod registry;
mod signature;

use std::fmt;

pub use error::HookError;
pub use registry::HookRegistry;
pub use signature::{Callback, HookSignature};

/// Stable identifier of a hook point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(pub u32);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
