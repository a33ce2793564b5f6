//! Hook point table: declaration, type-checked attachment and retrieval.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{HookError, HookId, HookSignature};

type Handler = Box<dyn Any + Send + Sync>;

/// A declared hook point: fixed signature plus handlers in attach order.
struct HookPoint {
    signature: HookSignature,
    handlers: Vec<Handler>,
}

/// Table of hook points.
///
/// Constructed explicitly and shared as `Arc<HookRegistry>` with every
/// subsystem that declares or fires hooks. Hook points are never removed
/// and handlers are only appended.
#[derive(Default)]
pub struct HookRegistry {
    points: RwLock<FxHashMap<HookId, HookPoint>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new hook point accepting callbacks of `signature`.
    pub fn declare(&self, id: HookId, signature: HookSignature) -> Result<(), HookError> {
        let mut points = self.points.write();

        if points.contains_key(&id) {
            return Err(HookError::Duplicate(id));
        }

        if !signature.is_callable() {
            crate::log!("hook"; "signature `{}` of hook {} is not a callback", signature.type_name(), id);
            return Err(HookError::InvalidSignature(signature.type_name()));
        }

        points.insert(
            id,
            HookPoint {
                signature,
                handlers: Vec::new(),
            },
        );
        crate::debug!("hook"; "declared hook {} as `{}`", id, signature.type_name());
        Ok(())
    }

    /// Append `handler` to the hook point `id`.
    ///
    /// The handler's type must be exactly the declared callback type, so
    /// closures are coerced first: `Arc::new(|x| x + 1) as Arc<MyHook>`.
    pub fn attach<F>(&self, id: HookId, handler: Arc<F>) -> Result<(), HookError>
    where
        F: ?Sized + Send + Sync + 'static,
    {
        let mut points = self.points.write();
        let point = points.get_mut(&id).ok_or(HookError::Unknown(id))?;

        let given = HookSignature::of_handler::<F>();
        if !point.signature.accepts(&given) {
            crate::log!(
                "hook";
                "handler type doesn't match the signature of hook {}: given `{}`, wanted `{}`",
                id,
                given.type_name(),
                point.signature.type_name()
            );
            return Err(HookError::SignatureMismatch {
                id,
                given: given.type_name(),
                wanted: point.signature.type_name(),
            });
        }

        point.handlers.push(Box::new(handler));
        Ok(())
    }

    /// Handlers of hook point `id` in attach order.
    ///
    /// Empty when `id` is unknown, has no handlers, or `F` is not the
    /// declared callback type. Firing an undeclared hook is a no-op.
    pub fn handlers<F>(&self, id: HookId) -> Vec<Arc<F>>
    where
        F: ?Sized + Send + Sync + 'static,
    {
        let points = self.points.read();
        let Some(point) = points.get(&id) else {
            return Vec::new();
        };

        point
            .handlers
            .iter()
            .filter_map(|handler| handler.downcast_ref::<Arc<F>>())
            .cloned()
            .collect()
    }

    pub fn is_declared(&self, id: HookId) -> bool {
        self.points.read().contains_key(&id)
    }

    /// Number of handlers attached to `id` (0 if undeclared).
    pub fn len(&self, id: HookId) -> usize {
        self.points.read().get(&id).map_or(0, |p| p.handlers.len())
    }

    pub fn signature(&self, id: HookId) -> Option<HookSignature> {
        self.points.read().get(&id).map(|p| p.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::signature::tests::{Binary, Unary};

    const PING: HookId = HookId(1);
    const LOG: HookId = HookId(2);

    fn registry() -> HookRegistry {
        let registry = HookRegistry::new();
        registry
            .declare(PING, HookSignature::callback::<Unary>())
            .unwrap();
        registry
    }

    #[test]
    fn test_attach_before_declare_fails() {
        let registry = HookRegistry::new();
        let handler: Arc<Unary> = Arc::new(|x: u32| x);
        assert_eq!(
            registry.attach(PING, handler),
            Err(HookError::Unknown(PING))
        );
        assert!(registry.handlers::<Unary>(PING).is_empty());
    }

    #[test]
    fn test_declare_twice_fails() {
        let registry = registry();
        assert_eq!(
            registry.declare(PING, HookSignature::callback::<Binary>()),
            Err(HookError::Duplicate(PING))
        );
        // The original signature is kept
        assert_eq!(
            registry.signature(PING),
            Some(HookSignature::callback::<Unary>())
        );
    }

    #[test]
    fn test_declare_non_callable_fails() {
        let registry = HookRegistry::new();
        let err = registry
            .declare(LOG, HookSignature::value::<String>())
            .unwrap_err();
        assert!(matches!(err, HookError::InvalidSignature(_)));
        assert!(!registry.is_declared(LOG));
    }

    #[test]
    fn test_mismatched_handler_is_rejected() {
        let registry = registry();
        registry
            .attach(PING, Arc::new(|x: u32| x + 1) as Arc<Unary>)
            .unwrap();

        let wrong: Arc<Binary> = Arc::new(|_: &str, _: u32| {});
        let err = registry.attach(PING, wrong).unwrap_err();
        assert!(matches!(err, HookError::SignatureMismatch { id, .. } if id == PING));

        let also_wrong: Arc<dyn Fn(u32) -> u64 + Send + Sync> = Arc::new(|x: u32| u64::from(x));
        assert!(registry.attach(PING, also_wrong).is_err());

        assert_eq!(registry.len(PING), 1);
    }

    #[test]
    fn test_handlers_keep_attach_order() {
        let registry = registry();
        for step in 1..=3u32 {
            let handler: Arc<Unary> = Arc::new(move |x: u32| x * 10 + step);
            registry.attach(PING, handler).unwrap();
        }

        let fired = registry
            .handlers::<Unary>(PING)
            .iter()
            .fold(0, |acc, handler| handler(acc));
        assert_eq!(fired, 123);
    }

    #[test]
    fn test_handlers_of_unknown_hook_are_empty() {
        let registry = registry();
        assert!(registry.handlers::<Unary>(HookId(99)).is_empty());
        assert_eq!(registry.len(HookId(99)), 0);
    }

    #[test]
    fn test_handlers_with_wrong_type_are_empty() {
        let registry = registry();
        registry
            .attach(PING, Arc::new(|x: u32| x) as Arc<Unary>)
            .unwrap();
        assert!(registry.handlers::<Binary>(PING).is_empty());
        assert_eq!(registry.handlers::<Unary>(PING).len(), 1);
    }
}
