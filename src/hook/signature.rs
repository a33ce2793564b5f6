//! Hook signature descriptors.
//!
//! A signature is a type descriptor, not a value: it records the `TypeId`
//! of the callback trait object a hook point accepts (for example
//! `dyn Fn(&str, Vec<u8>) -> Vec<u8> + Send + Sync`) along with its arity.
//! Two callbacks match when their trait object types are identical, which
//! covers parameter count, parameter types and return type at once.

use std::any::{TypeId, type_name};
use std::fmt;

/// Marks a callback trait object type usable as a hook signature.
///
/// Implemented next to each hook point for its `dyn Fn(..)` type:
///
/// ```ignore
/// pub type OnSave = dyn Fn(&str) + Send + Sync;
/// impl Callback for OnSave {
///     const ARITY: usize = 1;
/// }
/// ```
pub trait Callback: Send + Sync + 'static {
    /// Number of parameters the callback takes.
    const ARITY: usize;
}

/// Structural type descriptor of a hook callback.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HookSignature {
    type_id: TypeId,
    type_name: &'static str,
    /// `None` for descriptors that do not describe a callback.
    arity: Option<usize>,
}

impl HookSignature {
    /// Descriptor of the callback type `F`.
    pub fn callback<F: ?Sized + Callback>() -> Self {
        Self {
            type_id: TypeId::of::<F>(),
            type_name: type_name::<F>(),
            arity: Some(F::ARITY),
        }
    }

    /// Descriptor of an arbitrary, non-callable type.
    ///
    /// Declaring a hook point with such a descriptor fails.
    pub fn value<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            arity: None,
        }
    }

    /// Descriptor of whatever type `F` is, as seen by `attach`.
    pub(super) fn of_handler<F: ?Sized + 'static>() -> Self {
        Self::value::<F>()
    }

    pub fn is_callable(&self) -> bool {
        self.arity.is_some()
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether a handler of type `other` may be attached under `self`.
    pub fn accepts(&self, other: &HookSignature) -> bool {
        self.is_callable() && self.type_id == other.type_id
    }
}

impl fmt::Debug for HookSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSignature")
            .field("type", &self.type_name)
            .field("arity", &self.arity)
            .finish()
    }
}
