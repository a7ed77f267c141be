//! Tour engine — the application-wide owner of the active tour.
//!
//! State changes go through [`reduce`], a pure transition function over
//! [`TourState`]. The engine wraps it with the side effects: anchor
//! validation before activation, recording completion, and broadcasting
//! [`TourEvent`]s to overlays and telemetry.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use super::completion::CompletionStore;
use super::registry::{TourId, TourRegistry, TourStep};
use super::resolver::StepTargetResolver;

/// Default broadcast channel capacity.
const EVENT_CAPACITY: usize = 64;

/// A tour in progress. `steps` is never empty and `index < steps.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTour {
    pub tour_id: TourId,
    pub steps: Vec<TourStep>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TourState {
    #[default]
    Idle,
    Active(ActiveTour),
}

impl TourState {
    pub fn active_tour(&self) -> Option<TourId> {
        match self {
            Self::Idle => None,
            Self::Active(active) => Some(active.tour_id),
        }
    }
}

/// Inputs to [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourAction {
    /// Enter a tour with already-validated steps. Replaces any active tour.
    Activate { tour_id: TourId, steps: Vec<TourStep> },
    Next,
    Prev,
    Dismiss,
}

/// What happened, for overlays and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TourEvent {
    Started { tour_id: TourId, total_steps: usize },
    StepChanged { tour_id: TourId, index: usize },
    /// The user walked through the last step.
    Completed { tour_id: TourId },
    /// The user closed the tour early.
    Dismissed { tour_id: TourId, index: usize },
}

/// Apply `action` to `state`. Returns the resulting event, or `None` if the
/// action did not change anything.
pub fn reduce(state: &mut TourState, action: TourAction) -> Option<TourEvent> {
    match action {
        TourAction::Activate { tour_id, steps } => {
            if steps.is_empty() {
                return None;
            }
            let total_steps = steps.len();
            *state = TourState::Active(ActiveTour {
                tour_id,
                steps,
                index: 0,
            });
            Some(TourEvent::Started {
                tour_id,
                total_steps,
            })
        }
        TourAction::Next => {
            let TourState::Active(active) = state else {
                return None;
            };
            if active.index + 1 >= active.steps.len() {
                let tour_id = active.tour_id;
                *state = TourState::Idle;
                return Some(TourEvent::Completed { tour_id });
            }
            active.index += 1;
            Some(TourEvent::StepChanged {
                tour_id: active.tour_id,
                index: active.index,
            })
        }
        TourAction::Prev => {
            let TourState::Active(active) = state else {
                return None;
            };
            if active.index == 0 {
                return None;
            }
            active.index -= 1;
            Some(TourEvent::StepChanged {
                tour_id: active.tour_id,
                index: active.index,
            })
        }
        TourAction::Dismiss => {
            let TourState::Active(active) = state else {
                return None;
            };
            let event = TourEvent::Dismissed {
                tour_id: active.tour_id,
                index: active.index,
            };
            *state = TourState::Idle;
            Some(event)
        }
    }
}

/// Keep the steps whose anchor is present, renumbered 1..n in original order.
pub fn validate_steps(steps: &[TourStep], resolver: &dyn StepTargetResolver) -> Vec<TourStep> {
    steps
        .iter()
        .filter(|step| resolver.exists(&step.target_id))
        .zip(1..)
        .map(|(step, order)| TourStep {
            order,
            ..step.clone()
        })
        .collect()
}

/// The step currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub tour_id: TourId,
    pub step: TourStep,
    pub index: usize,
    pub total: usize,
    pub is_first: bool,
    pub is_last: bool,
}

/// Coordinates tours across pages. Create one per application and share it.
pub struct TourEngine {
    registry: TourRegistry,
    resolver: Arc<dyn StepTargetResolver>,
    store: Arc<CompletionStore>,
    state: RwLock<TourState>,
    events: broadcast::Sender<TourEvent>,
}

impl TourEngine {
    pub fn new(
        registry: TourRegistry,
        resolver: Arc<dyn StepTargetResolver>,
        store: Arc<CompletionStore>,
    ) -> Arc<Self> {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            registry,
            resolver,
            store,
            state: RwLock::new(TourState::Idle),
            events,
        })
    }

    /// Subscribe to tour events.
    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<CompletionStore> {
        &self.store
    }

    /// Try to start a tour. Returns whether it became active.
    ///
    /// Without `force`, a completed tour or the tour already running is left
    /// alone. Nothing starts before the completion store has loaded, and a
    /// tour none of whose anchors are on the page does not start.
    pub async fn start(&self, tour_id: TourId, force: bool) -> bool {
        let Some(definition) = self.registry.get(tour_id) else {
            debug!(tour_id = %tour_id, "No such tour registered");
            return false;
        };
        if !self.store.is_ready() {
            debug!(tour_id = %tour_id, "Completion store still loading, not starting tour");
            return false;
        }
        if !force && self.store.contains(tour_id) {
            debug!(tour_id = %tour_id, "Tour already completed");
            return false;
        }

        let mut state = self.state.write().await;
        if !force && state.active_tour() == Some(tour_id) {
            return false;
        }

        let steps = validate_steps(definition, self.resolver.as_ref());
        if steps.is_empty() {
            debug!(tour_id = %tour_id, "No tour anchors on the page, not starting");
            return false;
        }
        let skipped = definition.len() - steps.len();

        let event = reduce(&mut state, TourAction::Activate { tour_id, steps });
        drop(state);

        info!(tour_id = %tour_id, force, skipped, "Tour started");
        self.emit(event);
        true
    }

    /// Advance; on the last step this completes the tour.
    pub async fn next(&self) {
        self.dispatch(TourAction::Next).await;
    }

    /// Go back one step. No-op on the first step.
    pub async fn prev(&self) {
        self.dispatch(TourAction::Prev).await;
    }

    /// Close the tour. It counts as seen, like completing it.
    pub async fn dismiss(&self) {
        self.dispatch(TourAction::Dismiss).await;
    }

    pub fn is_completed(&self, tour_id: TourId) -> bool {
        self.store.contains(tour_id)
    }

    /// Forget every completed tour so all of them play again.
    pub fn reset(&self) {
        self.store.clear();
    }

    pub async fn active_tour(&self) -> Option<TourId> {
        self.state.read().await.active_tour()
    }

    pub async fn current(&self) -> Option<StepView> {
        let state = self.state.read().await;
        let TourState::Active(active) = &*state else {
            return None;
        };
        let step = active.steps.get(active.index)?.clone();
        let total = active.steps.len();
        Some(StepView {
            tour_id: active.tour_id,
            step,
            index: active.index,
            total,
            is_first: active.index == 0,
            is_last: active.index + 1 == total,
        })
    }

    async fn dispatch(&self, action: TourAction) {
        let event = {
            let mut state = self.state.write().await;
            reduce(&mut state, action)
        };

        match &event {
            Some(TourEvent::Completed { tour_id }) => {
                info!(tour_id = %tour_id, "Tour completed");
                self.store.mark_complete(*tour_id);
            }
            Some(TourEvent::Dismissed { tour_id, index }) => {
                info!(tour_id = %tour_id, step = index, "Tour dismissed");
                self.store.mark_complete(*tour_id);
            }
            _ => {}
        }
        self.emit(event);
    }

    fn emit(&self, event: Option<TourEvent>) {
        if let Some(event) = event {
            // Ok if nobody is listening.
            let _ = self.events.send(event);
        }
    }
}
