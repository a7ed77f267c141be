//! Page-level tour integration.
//!
//! A page says "run tour T while condition C holds" on every render pass.
//! [`TourMount`] turns those repeated calls into at most one delayed start
//! per tour per mount, plus a one-shot forced replay when the navigation
//! signal asks for it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::engine::TourEngine;
use super::registry::TourId;
use crate::config::Timings;
use crate::navigation::ReplaySignal;

/// What a render pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountAction {
    /// Nothing to do.
    Idle,
    /// A first-time start was scheduled.
    ScheduledAuto,
    /// A forced replay was scheduled and the signal consumed.
    ScheduledReplay,
    /// A pending start was cancelled because the condition no longer holds.
    Cancelled,
}

/// Tour triggers owned by one mounted page. Dropping it cancels its timers.
pub struct TourMount {
    engine: Arc<TourEngine>,
    timings: Timings,
    /// Tours this mount has already scheduled or started.
    guards: HashSet<TourId>,
    timers: HashMap<TourId, JoinHandle<()>>,
}

impl TourMount {
    pub fn new(engine: Arc<TourEngine>, timings: Timings) -> Self {
        Self {
            engine,
            timings,
            guards: HashSet::new(),
            timers: HashMap::new(),
        }
    }

    /// Called on every render pass of the page.
    pub fn render(&mut self, tour_id: TourId, condition: bool, replay: &ReplaySignal) -> MountAction {
        if !condition {
            return if self.cancel(tour_id) {
                MountAction::Cancelled
            } else {
                MountAction::Idle
            };
        }

        if replay.take_if(tour_id) {
            self.abort_timer(tour_id);
            self.guards.insert(tour_id);
            self.schedule(tour_id, self.timings.forced_restart, true);
            return MountAction::ScheduledReplay;
        }

        if self.guards.contains(&tour_id) {
            return MountAction::Idle;
        }
        if self.engine.store().is_ready() && self.engine.is_completed(tour_id) {
            return MountAction::Idle;
        }
        self.guards.insert(tour_id);
        self.schedule(tour_id, self.timings.auto_start, false);
        MountAction::ScheduledAuto
    }

    #[cfg(test)]
    fn is_pending(&self, tour_id: TourId) -> bool {
        self.timers
            .get(&tour_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel a pending start. A start that never fired releases its guard so
    /// a later render can schedule again.
    fn cancel(&mut self, tour_id: TourId) -> bool {
        let Some(handle) = self.timers.remove(&tour_id) else {
            return false;
        };
        if handle.is_finished() {
            return false;
        }
        handle.abort();
        self.guards.remove(&tour_id);
        debug!(tour_id = %tour_id, "Pending tour start cancelled");
        true
    }

    fn abort_timer(&mut self, tour_id: TourId) {
        if let Some(handle) = self.timers.remove(&tour_id) {
            handle.abort();
        }
    }

    fn schedule(&mut self, tour_id: TourId, delay: Duration, force: bool) {
        let engine = Arc::clone(&self.engine);
        debug!(tour_id = %tour_id, force, delay_ms = delay.as_millis() as u64, "Scheduling tour start");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.store().wait_ready().await;
            engine.start(tour_id, force).await;
        });
        self.timers.insert(tour_id, handle);
    }
}

impl Drop for TourMount {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tours::completion::tests::StubSync;
    use crate::tours::completion::{CompletionStore, MemoryCache};
    use crate::tours::registry::TourRegistry;
    use crate::tours::resolver::AnchorSet;

    async fn loaded_engine(seen: &[&str]) -> Arc<TourEngine> {
        let store = CompletionStore::new(
            Arc::new(MemoryCache::new()),
            Arc::new(StubSync::with_seen(seen)),
        );
        store.load().await;
        let registry = TourRegistry::builtin();
        let anchors = Arc::new(AnchorSet::with_anchors(
            registry
                .get(TourId::Budgets)
                .unwrap()
                .iter()
                .map(|s| s.target_id.clone())
                .collect::<Vec<_>>(),
        ));
        TourEngine::new(registry, anchors, store)
    }

    #[tokio::test(start_paused = true)]
    async fn auto_start_fires_after_delay_once() {
        let engine = loaded_engine(&[]).await;
        let signal = ReplaySignal::new();
        let mut mount = TourMount::new(engine.clone(), Timings::default());

        assert_eq!(
            mount.render(TourId::Budgets, true, &signal),
            MountAction::ScheduledAuto
        );
        // Overlapping render pass of the same page.
        assert_eq!(mount.render(TourId::Budgets, true, &signal), MountAction::Idle);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(engine.active_tour().await.is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.active_tour().await, Some(TourId::Budgets));

        engine.dismiss().await;
        assert_eq!(mount.render(TourId::Budgets, true, &signal), MountAction::Idle);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.active_tour().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn condition_change_cancels_pending_start() {
        let engine = loaded_engine(&[]).await;
        let signal = ReplaySignal::new();
        let mut mount = TourMount::new(engine.clone(), Timings::default());

        mount.render(TourId::Budgets, true, &signal);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            mount.render(TourId::Budgets, false, &signal),
            MountAction::Cancelled
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.active_tour().await.is_none());

        // Condition holds again: a fresh start can be scheduled.
        assert_eq!(
            mount.render(TourId::Budgets, true, &signal),
            MountAction::ScheduledAuto
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completed_tour_is_not_scheduled() {
        let engine = loaded_engine(&["budgets"]).await;
        let signal = ReplaySignal::new();
        let mut mount = TourMount::new(engine, Timings::default());
        assert_eq!(mount.render(TourId::Budgets, true, &signal), MountAction::Idle);
        assert!(!mount.is_pending(TourId::Budgets));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_forces_completed_tour_once() {
        let engine = loaded_engine(&["budgets"]).await;
        let signal = ReplaySignal::new();
        signal.request(TourId::Budgets);
        let mut mount = TourMount::new(engine.clone(), Timings::default());

        assert_eq!(
            mount.render(TourId::Budgets, true, &signal),
            MountAction::ScheduledReplay
        );
        assert!(signal.pending().is_none());
        assert_eq!(mount.render(TourId::Budgets, true, &signal), MountAction::Idle);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(engine.active_tour().await.is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.active_tour().await, Some(TourId::Budgets));

        engine.dismiss().await;
        let mut remount = TourMount::new(engine.clone(), Timings::default());
        assert_eq!(remount.render(TourId::Budgets, true, &signal), MountAction::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn replay_waits_for_condition() {
        let engine = loaded_engine(&[]).await;
        let signal = ReplaySignal::new();
        signal.request(TourId::Budgets);
        let mut mount = TourMount::new(engine, Timings::default());

        assert_eq!(mount.render(TourId::Budgets, false, &signal), MountAction::Idle);
        assert_eq!(signal.pending(), Some(TourId::Budgets));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_mount_cancels_timers() {
        let engine = loaded_engine(&[]).await;
        let signal = ReplaySignal::new();
        {
            let mut mount = TourMount::new(engine.clone(), Timings::default());
            mount.render(TourId::Budgets, true, &signal);
            assert!(mount.is_pending(TourId::Budgets));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.active_tour().await.is_none());
    }
}
