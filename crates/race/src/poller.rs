//! Periodic recomputation of one race's live view.
//!
//! Each pass loads a fresh snapshot, recomputes the [`LiveView`] from scratch
//! and publishes it to subscribers. Nothing carries over between passes.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    errors::AppError,
    live::{LiveEngine, LiveView},
    store::SharedStore,
};

pub type LiveReceiver = watch::Receiver<Option<Arc<LiveView>>>;

/// Read side of a running poller, shared with the HTTP handlers.
#[derive(Clone)]
pub struct LiveFeed {
    template_id: Uuid,
    rx: LiveReceiver,
}

impl LiveFeed {
    /// The last published view, if it belongs to `template_id`.
    pub fn latest(&self, template_id: Uuid) -> Option<Arc<LiveView>> {
        if template_id != self.template_id {
            return None;
        }
        self.rx.borrow().clone()
    }
}

pub struct Poller {
    store: SharedStore,
    clock: SharedClock,
    engine: LiveEngine,
    template_id: Uuid,
    tx: watch::Sender<Option<Arc<LiveView>>>,
}

impl Poller {
    pub fn new(store: SharedStore, clock: SharedClock, engine: LiveEngine, template_id: Uuid) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            store,
            clock,
            engine,
            template_id,
            tx,
        }
    }

    pub fn subscribe(&self) -> LiveReceiver {
        self.tx.subscribe()
    }

    pub fn feed(&self) -> LiveFeed {
        LiveFeed {
            template_id: self.template_id,
            rx: self.subscribe(),
        }
    }

    /// One recomputation pass. Loading the snapshot is the only step that waits.
    pub async fn tick(&self) -> Result<Arc<LiveView>, AppError> {
        let snapshot = self.store.load_snapshot(self.template_id).await?;
        let view = Arc::new(self.engine.compute(&snapshot, self.clock.now()));
        self.tx.send_replace(Some(view.clone()));
        Ok(view)
    }

    /// Ticks every `period` until `shutdown` flips to `true`.
    ///
    /// A slow pass delays the next one; missed ticks are skipped rather than
    /// replayed, and the following pass simply sees a later clock.
    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(template_id = %self.template_id, ?period, "Starting live poller");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    match self.tick().await {
                        Ok(view) => info!(
                            template_id = %self.template_id,
                            athletes = view.leaderboard.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Live view updated"
                        ),
                        Err(AppError::NotFound) => {
                            warn!(template_id = %self.template_id, "Race no longer exists, stopping poller");
                            return Ok(());
                        }
                        // Keep the previous view; the next tick retries.
                        Err(e) => error!(template_id = %self.template_id, "Live poll failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(template_id = %self.template_id, "Live poller shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checkpoint::CheckpointType,
        clock::ManualClock,
        snapshot::fixtures::*,
        store::{MemoryStore, RaceStore},
    };

    async fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, Poller) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_race(snapshot(
                vec![athlete(1, "Ada")],
                vec![crossing(1, CheckpointType::SwimStart, GUN)],
            ))
            .await;
        let clock = Arc::new(ManualClock::new(GUN));
        let poller = Poller::new(store.clone(), clock.clone(), LiveEngine::default(), template_id());
        (store, clock, poller)
    }

    #[tokio::test]
    async fn test_tick_publishes_view() {
        let (_, clock, poller) = setup().await;
        let rx = poller.subscribe();
        assert!(rx.borrow().is_none());

        clock.advance(time::Duration::minutes(15));
        poller.tick().await.unwrap();
        let view = rx.borrow().clone().unwrap();
        assert_eq!(view.generated_at, GUN + time::Duration::minutes(15));
        assert_eq!(view.leaderboard[0].distance_covered, 750.0);
    }

    #[tokio::test]
    async fn test_tick_sees_new_crossings() {
        let (store, clock, poller) = setup().await;
        clock.advance(time::Duration::minutes(29));
        store
            .upsert_recorded_time(
                template_id(),
                crossing(1, CheckpointType::SwimEnd, GUN + time::Duration::minutes(29)),
            )
            .await
            .unwrap();

        let view = poller.tick().await.unwrap();
        assert_eq!(view.leaderboard[0].last_checkpoint, Some(CheckpointType::SwimEnd));
    }

    #[tokio::test]
    async fn test_tick_unknown_race() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(GUN));
        let poller = Poller::new(store, clock, LiveEngine::default(), template_id());
        assert!(matches!(poller.tick().await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_feed_serves_only_its_race() {
        let (_, _, poller) = setup().await;
        let feed = poller.feed();
        assert!(feed.latest(template_id()).is_none());

        poller.tick().await.unwrap();
        assert!(feed.latest(template_id()).is_some());
        assert!(feed.latest(Uuid::nil()).is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_, _, poller) = setup().await;
        let mut rx = poller.subscribe();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(poller.run(Duration::from_secs(10), stop_rx));

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        stop_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
