//! Hook slots
//!
//! A slot is the binding point the host reads its primitive from. The host
//! (or another script) may rebind it at any time, displacing our observer;
//! the guardian notices and wraps whatever is currently bound.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Implemented by every hookable primitive
pub trait Observable {
    /// Whether this instance is one of our observers
    fn is_observed(&self) -> bool {
        false
    }
}

/// Rebindable holder of a host primitive
pub struct HookSlot<T: ?Sized> {
    current: RwLock<Arc<T>>,
}

impl<T: ?Sized + Observable> HookSlot<T> {
    /// Create slot bound to `initial`
    #[must_use]
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Currently bound primitive
    #[must_use]
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Rebind the slot, returning the previous primitive
    pub fn replace(&self, next: Arc<T>) -> Arc<T> {
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Whether the bound primitive is observed
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.current.read().is_observed()
    }

    /// Wrap the bound primitive unless it is already observed
    ///
    /// Returns `true` when a wrap happened.
    pub fn ensure_wrapped<F>(&self, wrap: F) -> bool
    where
        F: FnOnce(Arc<T>) -> Arc<T>,
    {
        let mut current = self.current.write();
        if current.is_observed() {
            return false;
        }
        let inner = Arc::clone(&current);
        *current = wrap(inner);
        true
    }
}

impl<T: ?Sized> fmt::Debug for HookSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlot").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Observable + Send + Sync {
        fn greet(&self) -> String;
    }

    struct Plain;
    impl Observable for Plain {}
    impl Greeter for Plain {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Loud(Arc<dyn Greeter>);
    impl Observable for Loud {
        fn is_observed(&self) -> bool {
            true
        }
    }
    impl Greeter for Loud {
        fn greet(&self) -> String {
            self.0.greet().to_uppercase()
        }
    }

    fn wrap(inner: Arc<dyn Greeter>) -> Arc<dyn Greeter> {
        Arc::new(Loud(inner))
    }

    #[test]
    fn wraps_once() {
        let slot: HookSlot<dyn Greeter> = HookSlot::new(Arc::new(Plain));
        assert!(!slot.is_observed());
        assert!(slot.ensure_wrapped(wrap));
        assert!(!slot.ensure_wrapped(wrap));
        assert_eq!(slot.get().greet(), "HELLO");
    }

    #[test]
    fn rewraps_after_displacement() {
        let slot: HookSlot<dyn Greeter> = HookSlot::new(Arc::new(Plain));
        slot.ensure_wrapped(wrap);
        let previous = slot.replace(Arc::new(Plain));
        assert!(previous.is_observed());
        assert!(!slot.is_observed());
        assert!(slot.ensure_wrapped(wrap));
        assert_eq!(slot.get().greet(), "HELLO");
    }
}
