//! Callbacks notified synchronously on every committed result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use super::result::GatherResult;
use crate::gatherer::AnyGatherer;

/// Receives every new result of every gatherer.
///
/// Observers run on the producing gatherer's own loop, after the result has
/// been committed and before the next wait starts. A slow observer therefore
/// delays that gatherer's next sample; it does not affect other gatherers.
pub trait Observer: Send + Sync {
    fn observe(&self, name: &str, gatherer: &dyn AnyGatherer, result: &GatherResult);
}

impl<F> Observer for F
where
    F: Fn(&str, &dyn AnyGatherer, &GatherResult) + Send + Sync,
{
    fn observe(&self, name: &str, gatherer: &dyn AnyGatherer, result: &GatherResult) {
        self(name, gatherer, result)
    }
}

/// Ordered list of observers.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<dyn Observer>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Invokes every observer in registration order.
    ///
    /// The list is copied first so observers may register further observers.
    /// A panicking observer is logged and skipped.
    pub fn notify(&self, name: &str, gatherer: &dyn AnyGatherer, result: &GatherResult) {
        let observers: Vec<Arc<dyn Observer>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, observer) in observers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                observer.observe(name, gatherer, result)
            }));
            if outcome.is_err() {
                warn!(
                    gatherer = name,
                    observer = index,
                    generation = result.generation(),
                    "observer panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatherer::from_fn;
    use std::sync::Mutex;

    #[test]
    fn test_notify_in_registration_order() {
        let registry = ObserverRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = calls.clone();
            registry.add(Arc::new(
                move |name: &str, _: &dyn AnyGatherer, result: &GatherResult| {
                    calls
                        .lock()
                        .unwrap()
                        .push(format!("{}:{}:{}", tag, name, result.generation()));
                },
            ));
        }

        let gatherer = from_fn(|| Ok(1));
        registry.notify("x", &gatherer, &GatherResult::default());

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:x:0", "second:x:0", "third:x:0"]
        );
    }

    #[test]
    fn test_panicking_observer_does_not_stop_others() {
        let registry = ObserverRegistry::new();
        let reached = Arc::new(Mutex::new(false));

        fn failing(_: &str, _: &dyn AnyGatherer, _: &GatherResult) {
            panic!("observer failure");
        }

        registry.add(Arc::new(failing));
        {
            let reached = reached.clone();
            registry.add(Arc::new(
                move |_: &str, _: &dyn AnyGatherer, _: &GatherResult| {
                    *reached.lock().unwrap() = true;
                },
            ));
        }

        let gatherer = from_fn(|| Ok(()));
        registry.notify("x", &gatherer, &GatherResult::default());
        assert!(*reached.lock().unwrap());
    }

    #[test]
    fn test_observer_can_register_observer() {
        let registry = Arc::new(ObserverRegistry::new());
        {
            let inner = registry.clone();
            registry.add(Arc::new(
                move |_: &str, _: &dyn AnyGatherer, _: &GatherResult| {
                    inner.add(Arc::new(|_: &str, _: &dyn AnyGatherer, _: &GatherResult| {}));
                },
            ));
        }

        let gatherer = from_fn(|| Ok(()));
        registry.notify("x", &gatherer, &GatherResult::default());
        assert_eq!(registry.len(), 2);
    }
}
