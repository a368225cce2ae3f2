//! The poll loop: build a snapshot, diff it, emit what changed.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use icingawatch_types::{Event, Snapshot};

use crate::data::SnapshotBuilder;
use crate::emit::{detect, Output};

/// Drives one [`SnapshotBuilder`] and fans events out to every output.
pub struct Poller {
    builder: SnapshotBuilder,
    outputs: Vec<Output>,
    previous: Option<Snapshot>,
    interval: Duration,
}

impl Poller {
    pub fn new(builder: SnapshotBuilder, outputs: Vec<Output>, interval: Duration) -> Self {
        Self {
            builder,
            outputs,
            previous: None,
            interval,
        }
    }

    /// The snapshot from the last completed tick.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Run one poll cycle and return the events it emitted.
    ///
    /// Delivery failures are logged per output and never stop the tick.
    pub async fn tick(&mut self) -> Vec<Event> {
        let snapshot = self.builder.build().await;
        let events = detect(self.previous.as_ref(), &snapshot);

        for event in &events {
            tracing::debug!(event = event.name, "Emitting event");
            for output in &self.outputs {
                if let Err(e) = output.emit(event).await {
                    tracing::error!(event = event.name, error = %e, "Failed to emit event");
                }
            }
        }

        tracing::info!(
            events = events.len(),
            hosts = snapshot.hosts.all,
            services = snapshot.services.all,
            "Tick complete"
        );

        self.previous = Some(snapshot);
        events
    }

    /// Tick on the configured interval until `shutdown` resolves.
    ///
    /// The first tick fires immediately. A tick in progress always
    /// completes before shutdown is observed.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval_timer = tokio::time::interval(self.interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    self.tick().await;
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }
    }
}
