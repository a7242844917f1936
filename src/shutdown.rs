//! Stop signal and pacing shared by a node's background tasks
//!
//! The binary never fires it; a node there runs until the process is killed.
//! In-process callers (tests, embedders) use it to stop every loop and the
//! HTTP server deterministically.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

/// Sending side, owned by the node handle
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }
}

/// Resolve once a stop was requested or the trigger is gone
pub async fn requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Ticker for a periodic loop
///
/// The first tick is immediate. A round that overruns the period is followed
/// by a full period of rest, never by a burst of catch-up ticks.
pub fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
