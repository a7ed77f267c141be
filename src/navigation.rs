//! Navigation capability and the "replay this tour" signal.

use std::sync::Mutex;

use crate::tours::TourId;

/// Where to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// An in-app route, e.g. `/dashboard`.
    Route(String),
    /// A full-page load of an external URL. The app is left behind.
    External(String),
}

/// Performs navigation on behalf of the client core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget);
}

/// Navigation state asking a page to replay a tour.
///
/// Set by whoever links to a page with "show me around again"; consumed by
/// the page's tour mount exactly once.
#[derive(Debug, Default)]
pub struct ReplaySignal {
    slot: Mutex<Option<TourId>>,
}

impl ReplaySignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `tour_id` to be replayed on the next render of its page.
    pub fn request(&self, tour_id: TourId) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tour_id);
    }

    /// Consume the signal if it names `tour_id`.
    pub fn take_if(&self, tour_id: TourId) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if *slot == Some(tour_id) {
            *slot = None;
            return true;
        }
        false
    }

    pub fn pending(&self) -> Option<TourId> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
