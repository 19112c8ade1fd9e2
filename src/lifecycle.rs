//! Page lifecycle notifications and the bounded wait on a named event.
//!
//! Backends publish every `Page.lifecycleEvent` they receive into a
//! [`LifecycleBus`]. Callers [`subscribe`](LifecycleBus::subscribe) before
//! triggering the navigation and then block on
//! [`Subscription::wait_for`], which races the matching event against a
//! deadline and the run's cancellation token. Dropping the subscription
//! removes its listener whatever the outcome.
//!
//! The browser does not order these events reliably: `networkIdle` has been
//! observed before `load`. The caller picks the event name knowing that.

use crate::{Error, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Upper bound on a single lifecycle wait
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Event the screenshot sequence waits for by default
pub const NETWORK_IDLE: &str = "networkIdle";

/// Lifecycle event names Chrome is known to emit
pub const KNOWN_EVENTS: [&str; 10] = [
    "init",
    "DOMContentLoaded",
    "firstPaint",
    "firstContentfulPaint",
    "firstImagePaint",
    "firstMeaningfulPaintCandidate",
    "load",
    "networkAlmostIdle",
    "firstMeaningfulPaint",
    NETWORK_IDLE,
];

/// Whether `name` is one of [`KNOWN_EVENTS`]
pub fn is_known_event(name: &str) -> bool {
    KNOWN_EVENTS.contains(&name)
}

/// A lifecycle notification emitted by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub name: String,
    pub frame_id: String,
    pub loader_id: String,
}

impl LifecycleEvent {
    pub fn named(name: &str) -> Self {
        LifecycleEvent { name: name.to_string(), frame_id: String::new(), loader_id: String::new() }
    }
}

type Listeners = Mutex<HashMap<u64, UnboundedSender<LifecycleEvent>>>;

/// Fan-out hub for lifecycle notifications
///
/// Cloning yields another handle onto the same set of listeners, so a
/// backend can move a clone into its protocol callback.
#[derive(Clone, Default)]
pub struct LifecycleBus {
    listeners: Arc<Listeners>,
    next_id: Arc<AtomicU64>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it lives until the returned handle is dropped
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);
        Subscription { id, rx, listeners: Arc::clone(&self.listeners) }
    }

    /// Deliver `event` to every live subscription
    pub fn publish(&self, event: LifecycleEvent) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    /// Drop every listener; pending waits observe a closed stream
    pub fn close(&self) {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A registered listener on a [`LifecycleBus`]
pub struct Subscription {
    id: u64,
    rx: UnboundedReceiver<LifecycleEvent>,
    listeners: Arc<Listeners>,
}

impl Subscription {
    /// Block until an event called `event_name` arrives.
    ///
    /// Fails with [`Error::Cancelled`] if `cancel` fires first and with
    /// [`Error::Timeout`] once `timeout` elapses. Cancellation is polled
    /// before the deadline so a cancelled run never reports a timeout.
    pub async fn wait_for(
        &mut self,
        event_name: &str,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<LifecycleEvent> {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = &mut deadline => {
                    return Err(Error::Timeout {
                        event: event_name.to_string(),
                        ms: timeout.as_millis(),
                    })
                }
                received = self.rx.recv() => match received {
                    Some(ev) if ev.name == event_name => {
                        debug!("lifecycle event '{}' observed (frame {})", ev.name, ev.frame_id);
                        return Ok(ev);
                    }
                    Some(ev) => debug!("skipping lifecycle event '{}'", ev.name),
                    None => {
                        return Err(Error::InitializationError(
                            "lifecycle event stream closed".into(),
                        ))
                    }
                },
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Subscribe to `bus` and wait for `event_name`.
///
/// Only events published after this call are seen; use
/// [`LifecycleBus::subscribe`] directly to register before triggering the
/// action that produces the event.
pub async fn wait_for(
    bus: &LifecycleBus,
    event_name: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<LifecycleEvent> {
    if !is_known_event(event_name) {
        warn!("waiting for unknown lifecycle event '{}'", event_name);
    }
    let mut subscription = bus.subscribe();
    subscription.wait_for(event_name, cancel, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_event_wins() {
        let bus = LifecycleBus::new();
        let mut sub = bus.subscribe();
        bus.publish(LifecycleEvent::named("load"));
        bus.publish(LifecycleEvent::named("networkIdle"));

        let cancel = CancellationToken::new();
        let ev = sub.wait_for("networkIdle", &cancel, WAIT_TIMEOUT).await.unwrap();
        assert_eq!(ev.name, "networkIdle");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_yields_timeout() {
        let bus = LifecycleBus::new();
        let cancel = CancellationToken::new();
        bus.publish(LifecycleEvent::named("load"));

        let err = wait_for(&bus, "networkIdle", &cancel, WAIT_TIMEOUT).await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_not_reported_as_timeout() {
        let bus = LifecycleBus::new();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let err = wait_for(&bus, "networkIdle", &cancel, WAIT_TIMEOUT).await.unwrap_err();
        assert!(err.is_cancelled(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn already_cancelled_wins_over_pending_event() {
        let bus = LifecycleBus::new();
        let mut sub = bus.subscribe();
        bus.publish(LifecycleEvent::named("networkIdle"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = sub.wait_for("networkIdle", &cancel, WAIT_TIMEOUT).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn listener_is_removed_on_every_outcome() {
        let bus = LifecycleBus::new();
        let cancel = CancellationToken::new();

        {
            let mut sub = bus.subscribe();
            assert_eq!(bus.listener_count(), 1);
            bus.publish(LifecycleEvent::named("load"));
            sub.wait_for("load", &cancel, WAIT_TIMEOUT).await.unwrap();
        }
        assert_eq!(bus.listener_count(), 0);

        let err = wait_for(&bus, "load", &cancel, Duration::from_millis(1)).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn closed_bus_fails_the_wait() {
        let bus = LifecycleBus::new();
        let mut sub = bus.subscribe();
        bus.close();
        let cancel = CancellationToken::new();
        let err = sub.wait_for("load", &cancel, WAIT_TIMEOUT).await.unwrap_err();
        assert!(matches!(err, Error::InitializationError(_)));
    }

    #[test]
    fn every_subscriber_gets_a_copy() {
        let bus = LifecycleBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(LifecycleEvent::named("init"));
        assert_eq!(a.rx.try_recv().unwrap().name, "init");
        assert_eq!(b.rx.try_recv().unwrap().name, "init");
    }

    #[test]
    fn known_event_names() {
        assert!(is_known_event("networkIdle"));
        assert!(is_known_event("DOMContentLoaded"));
        assert!(!is_known_event("networkidle"));
    }
}
