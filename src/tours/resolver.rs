//! Step target resolution: does a step's anchor exist on the page right now?
//!
//! Queried once when a tour starts. Not a live observer.

use std::collections::HashSet;
use std::sync::RwLock;

/// Reports whether an anchor is currently rendered.
pub trait StepTargetResolver: Send + Sync {
    fn exists(&self, target_id: &str) -> bool;
}

impl<F> StepTargetResolver for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, target_id: &str) -> bool {
        self(target_id)
    }
}

/// Anchors a front-end reports as mounted.
#[derive(Debug, Default)]
pub struct AnchorSet {
    anchors: RwLock<HashSet<String>>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchors<I, S>(anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anchors: RwLock::new(anchors.into_iter().map(Into::into).collect()),
        }
    }

    pub fn mount(&self, target_id: impl Into<String>) {
        self.anchors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(target_id.into());
    }

    pub fn unmount(&self, target_id: &str) {
        self.anchors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(target_id);
    }

    /// Replace the whole set, e.g. after a page navigation.
    pub fn replace<I, S>(&self, anchors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.anchors.write().unwrap_or_else(|e| e.into_inner()) =
            anchors.into_iter().map(Into::into).collect();
    }
}

impl StepTargetResolver for AnchorSet {
    fn exists(&self, target_id: &str) -> bool {
        self.anchors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(target_id)
    }
}
