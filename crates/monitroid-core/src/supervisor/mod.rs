//! Background gatherer supervisor.
//!
//! The [`Supervisor`] runs any number of named [`Gatherer`]s, each on its own
//! periodic loop, keeps the latest [`GatherResult`] of each in a versioned
//! store, pushes every new result to registered [`Observer`]s, and renders a
//! consistent [`Dump`] of all results on demand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Supervisor                        │
//! │                                                          │
//! │  register(name, interval, gatherer)                      │
//! │        │                                                 │
//! │        ▼  one tokio task per gatherer                    │
//! │  ┌───────────┐  sample  ┌──────────────┐  notify         │
//! │  │ scheduler │ ───────► │ ResultStore  │ ─────────► observers
//! │  └───────────┘  commit  │ (RwLock)     │                 │
//! │        ▲                └──────┬───────┘                 │
//! │        │ stop (watch)          │ snapshot                │
//! │                                ▼                         │
//! │                          dump() / dump_json()            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use monitroid_core::gatherer::from_fn;
//! use monitroid_core::supervisor::Supervisor;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let supervisor = Supervisor::new(tokio::runtime::Handle::current());
//! supervisor
//!     .register("answer", Duration::from_secs(1), from_fn(|| Ok(42)))
//!     .unwrap();
//!
//! // Registered gatherers are visible immediately, before their first sample.
//! let dump = supervisor.dump();
//! assert_eq!(dump.gatherers["answer"].generation(), 0);
//!
//! supervisor.stop();
//! # }
//! ```
//!
//! Observers run synchronously on the loop of the gatherer that produced the
//! result. A blocking observer starves that gatherer's schedule, so observers
//! that do real work should hand it off to their own task.

mod dump;
mod error;
mod observer;
mod result;
mod scheduler;
mod store;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::gatherer::{AnyGatherer, Gatherer};

pub use dump::Dump;
pub use error::SupervisorError;
pub use observer::{Observer, ObserverRegistry};
pub use result::{GatherResult, Outcome};
pub use store::ResultStore;

use scheduler::Registration;

/// State shared between the supervisor and its gatherer loops.
pub(crate) struct Shared {
    store: ResultStore,
    observers: ObserverRegistry,
}

/// Owns the result store and every gatherer loop.
///
/// Dropping the supervisor stops all loops, like [`Supervisor::stop`].
pub struct Supervisor {
    runtime: Handle,
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    /// Creates an empty supervisor whose gatherer loops run on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            runtime,
            shared: Arc::new(Shared {
                store: ResultStore::new(),
                observers: ObserverRegistry::new(),
            }),
            stop_tx,
            loops: Mutex::new(Vec::new()),
        }
    }

    /// Registers `gatherer` under `name`, sampled every `interval`.
    ///
    /// The name appears in the store as not ready before this returns, and the
    /// first sample is taken right away.
    pub fn register<G: Gatherer>(
        &self,
        name: impl Into<String>,
        interval: Duration,
        gatherer: G,
    ) -> Result<(), SupervisorError> {
        self.register_dyn(name, interval, Arc::new(gatherer))
    }

    /// Registers an already type-erased gatherer. See [`Supervisor::register`].
    pub fn register_dyn(
        &self,
        name: impl Into<String>,
        interval: Duration,
        gatherer: Arc<dyn AnyGatherer>,
    ) -> Result<(), SupervisorError> {
        let name = name.into();

        if interval.is_zero() {
            return Err(SupervisorError::ZeroInterval(name));
        }
        if self.is_stopped() {
            return Err(SupervisorError::Stopped(name));
        }
        self.shared.store.insert(&name)?;

        let registration = Registration {
            name: name.as_str().into(),
            interval,
            gatherer,
        };
        let handle = self.runtime.spawn(scheduler::run(
            registration,
            self.shared.clone(),
            self.stop_tx.subscribe(),
        ));
        self.loops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);

        info!(gatherer = %name, interval = ?interval, "gatherer registered");
        Ok(())
    }

    /// Adds an observer notified of every new result, after those already added.
    pub fn observe<O: Observer + 'static>(&self, observer: O) {
        self.shared.observers.add(Arc::new(observer));
    }

    /// Latest result of `name`, or `None` if it was never registered.
    pub fn get(&self, name: &str) -> Option<GatherResult> {
        self.shared.store.get(name)
    }

    /// Copy of every result, taken at one instant.
    pub fn snapshot(&self) -> BTreeMap<String, GatherResult> {
        self.shared.store.snapshot()
    }

    /// Point-in-time document of every registered gatherer.
    pub fn dump(&self) -> Dump {
        Dump {
            gatherers: self.snapshot(),
        }
    }

    /// Writes [`Supervisor::dump`] as JSON to `writer`.
    ///
    /// The store lock is only held while copying, never while writing.
    pub fn dump_json<W: Write>(&self, writer: W) -> Result<(), SupervisorError> {
        self.dump().write_json(writer)
    }

    /// Number of registered gatherers.
    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    /// True when no gatherer has been registered.
    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Signals every gatherer loop to exit and returns without waiting.
    ///
    /// Results already committed stay in the store.
    pub fn stop(&self) {
        // Closing the store first means nothing commits once this returns,
        // even a sample that passed its loop's stop check.
        self.shared.store.close();
        if self.stop_tx.send_replace(true) {
            warn!("supervisor stopped twice");
        } else {
            info!(gatherers = self.len(), "supervisor stopping");
        }
    }

    /// True once [`Supervisor::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Waits until every gatherer loop has exited. Only returns after `stop()`.
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.loops.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "gatherer loop ended abnormally");
            }
        }
    }
}
