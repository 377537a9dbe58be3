use std::sync::{Arc, PoisonError, RwLock};

use super::annotation::SessionAnnotation;

/// Receives one call per driving-session transition.
///
/// Calls happen synchronously on the transition path, in registration order.
/// A slow listener delays every listener after it and the acknowledgment to
/// the power source, which may be gating a system-wide power transition.
/// Keep the work short or hand it off to another task.
pub trait SessionControllerCallback: Send + Sync {
    fn on_session_state_changed(&self, annotation: &SessionAnnotation);
}

impl<F> SessionControllerCallback for F
where
    F: Fn(&SessionAnnotation) + Send + Sync,
{
    fn on_session_state_changed(&self, annotation: &SessionAnnotation) {
        self(annotation);
    }
}

/// Insertion-ordered set of listeners, keyed by `Arc` identity.
///
/// Notification passes work on a copy from [`CallbackRegistry::snapshot`],
/// so registering from inside a listener never disturbs the pass in flight.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<Vec<Arc<dyn SessionControllerCallback>>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the callback was already registered.
    pub fn register(&self, callback: Arc<dyn SessionControllerCallback>) -> bool {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        if callbacks.iter().any(|existing| same_callback(existing, &callback)) {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Returns `false` if the callback was not registered.
    pub fn unregister<C>(&self, callback: &Arc<C>) -> bool
    where
        C: SessionControllerCallback + ?Sized,
    {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|existing| !same_callback(existing, callback));
        callbacks.len() != before
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn SessionControllerCallback>> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Compare data pointers only; vtable pointers for one type may differ across codegen units.
fn same_callback<A, B>(a: &Arc<A>, b: &Arc<B>) -> bool
where
    A: ?Sized,
    B: ?Sized,
{
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
