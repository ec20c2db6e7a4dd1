//! Poll/listen adapter.
//!
//! A subscription wakes its callback in two ways:
//! - immediately, when a storage event for the product slot or the
//!   last-update slot arrives on the page's bus (native or synthetic);
//! - on a timer, when the last-update slot differs from the last value this
//!   subscription saw. This catches writers that raise no event at all, such
//!   as another process sharing a [`crate::storage::FileStorage`].
//!
//! Callbacks run under a per-subscription gate. `unsubscribe` takes the same
//! gate, so once it returns no callback is running and none will start.

use crate::core::bus::{ChangeBus, StorageEvent};
use crate::core::notify::read_last_update;
use crate::core::store::LocalProductStore;
use crate::errors::{Error, Result};
use crate::storage::{LAST_UPDATE_KEY, LEGACY_LAST_UPDATE_KEY, PRODUCTS_KEY, SharedStorage};
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Why a callback fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeTrigger {
    /// A storage event for a watched slot
    Event(StorageEvent),
    /// The poll saw a different last-update value
    Poll {
        /// Stamp remembered before this tick
        previous: Option<String>,
        /// Stamp read on this tick
        current: Option<String>,
    },
    /// The listener fell behind the bus and missed events
    Lagged(u64),
}

type Gate = ReentrantMutex<Cell<bool>>;

fn is_watched(key: &str) -> bool {
    key == PRODUCTS_KEY || key == LAST_UPDATE_KEY || key == LEGACY_LAST_UPDATE_KEY
}

/// Cancels a subscription. Cheap to clone; usable from inside the callback.
#[derive(Debug, Clone)]
pub struct UnsubscribeHandle {
    gate: Arc<Gate>,
    task: AbortHandle,
}

impl UnsubscribeHandle {
    /// Stops the subscription. Idempotent.
    ///
    /// Blocks while a callback is running on another thread.
    pub fn unsubscribe(&self) {
        let active = self.gate.lock();
        if active.replace(false) {
            self.task.abort();
            debug!("Subscription cancelled");
        }
    }

    /// `false` once unsubscribed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gate.lock().get()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    handle: UnsubscribeHandle,
}

impl Subscription {
    /// A detachable handle for cancelling this subscription.
    #[must_use]
    pub fn handle(&self) -> UnsubscribeHandle {
        self.handle.clone()
    }

    /// See [`UnsubscribeHandle::unsubscribe`].
    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }

    /// `false` once unsubscribed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

/// Runs `callback` whenever the product list may have changed.
///
/// `poll_interval` is the timer period; it must be non-zero.
///
/// # Errors
/// - [`Error::Runtime`] when called outside a Tokio runtime
/// - [`Error::Config`] for a zero `poll_interval`
pub fn subscribe<F>(
    storage: SharedStorage,
    bus: &ChangeBus,
    poll_interval: Duration,
    callback: F,
) -> Result<Subscription>
where
    F: Fn(&ChangeTrigger) + Send + Sync + 'static,
{
    if poll_interval.is_zero() {
        return Err(Error::Config {
            message: "poll interval must be greater than zero".to_string(),
        });
    }
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| Error::Runtime {
        message: e.to_string(),
    })?;

    // Both are captured before returning so nothing written after
    // `subscribe` returns can be missed.
    let mut events = bus.subscribe();
    let mut last_seen = read_last_update(&storage);

    let gate: Arc<Gate> = Arc::new(ReentrantMutex::new(Cell::new(true)));
    let task_gate = Arc::clone(&gate);

    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;

        loop {
            let trigger = tokio::select! {
                received = events.recv(), if listening => match received {
                    Ok(event) if is_watched(&event.key) => {
                        last_seen = read_last_update(&storage);
                        Some(ChangeTrigger::Event(event))
                    }
                    Ok(event) => {
                        trace!(key = %event.key, "Ignoring unrelated storage event");
                        None
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Subscription lagged behind the change bus");
                        last_seen = read_last_update(&storage);
                        Some(ChangeTrigger::Lagged(missed))
                    }
                    Err(RecvError::Closed) => {
                        debug!("Change bus closed, continuing with polling only");
                        listening = false;
                        None
                    }
                },
                _ = ticker.tick() => {
                    let current = read_last_update(&storage);
                    if current == last_seen {
                        None
                    } else {
                        let previous = std::mem::replace(&mut last_seen, current.clone());
                        Some(ChangeTrigger::Poll { previous, current })
                    }
                }
            };

            if let Some(trigger) = trigger {
                let active = task_gate.lock();
                if !active.get() {
                    break;
                }
                callback(&trigger);
            }
        }
    });

    debug!(?poll_interval, "Subscription started");
    Ok(Subscription {
        handle: UnsubscribeHandle {
            gate,
            task: task.abort_handle(),
        },
    })
}

impl LocalProductStore {
    /// Subscribes to changes of this store's product list.
    ///
    /// # Errors
    /// See [`subscribe`].
    pub fn subscribe<F>(&self, poll_interval: Duration, callback: F) -> Result<Subscription>
    where
        F: Fn(&ChangeTrigger) + Send + Sync + 'static,
    {
        subscribe(Arc::clone(self.storage()), self.bus(), poll_interval, callback)
    }
}
