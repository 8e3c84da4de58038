//! Per-gatherer scheduling loop.
//!
//! Each registration gets one task cycling through
//! wait → sample → commit → notify. The first sample fires immediately; later
//! waits start after the previous cycle finished, so a slow gatherer pushes
//! its samples later instead of bursting to catch up.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, trace};

use super::Shared;
use super::result::Outcome;
use crate::gatherer::{AnyGatherer, GatherError};

#[derive(Clone)]
pub(super) struct Registration {
    pub(super) name: Arc<str>,
    pub(super) interval: Duration,
    pub(super) gatherer: Arc<dyn AnyGatherer>,
}

pub(super) async fn run(
    registration: Registration,
    shared: Arc<Shared>,
    mut stop: watch::Receiver<bool>,
) {
    debug!(
        gatherer = %registration.name,
        kind = registration.gatherer.type_name(),
        interval = ?registration.interval,
        "gatherer loop started"
    );

    let mut delay = Duration::ZERO;

    loop {
        tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            _ = tokio::time::sleep(delay) => {}
        }

        // The gatherer may block, and so may observers.
        let cycle = {
            let registration = registration.clone();
            let shared = shared.clone();
            let stop = stop.clone();
            tokio::task::spawn_blocking(move || sample_once(&registration, &shared, &stop))
        };

        // Stop does not wait for an in-flight sample; the blocking thread
        // finishes on its own and discards its result.
        tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            joined = cycle => {
                if let Err(e) = joined {
                    error!(gatherer = %registration.name, error = %e, "sampling cycle aborted");
                }
            }
        }

        delay = registration.interval;
    }

    debug!(gatherer = %registration.name, "gatherer loop stopped");
}

/// Resolves once stop has been signalled or the supervisor was dropped.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

fn sample_once(registration: &Registration, shared: &Shared, stop: &watch::Receiver<bool>) {
    let name = &*registration.name;
    let gatherer = registration.gatherer.as_ref();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| gatherer.sample())) {
        Ok(Ok(value)) => Outcome::Success(Arc::new(value)),
        Ok(Err(err)) => {
            debug!(gatherer = name, error = %err, "sampling failed");
            Outcome::Failure(Arc::new(err))
        }
        Err(_) => {
            error!(gatherer = name, "gatherer panicked");
            Outcome::Failure(Arc::new(GatherError::Panicked))
        }
    };

    if *stop.borrow() {
        trace!(gatherer = name, "discarding sample taken across stop");
        return;
    }

    // The store re-checks under its lock; stop may land after the check above.
    let Some(result) = shared.store.commit(name, outcome) else {
        trace!(gatherer = name, "discarding sample taken across stop");
        return;
    };
    trace!(gatherer = name, generation = result.generation(), "result committed");

    shared.observers.notify(name, gatherer, &result);
}
