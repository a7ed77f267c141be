//! Product tours: multi-step walkthroughs anchored to page elements.
//!
//! A page asks for a tour through a [`TourMount`]; the shared [`TourEngine`]
//! validates the steps against the anchors currently on the page, runs the
//! tour, and records it in the [`CompletionStore`] when the user finishes or
//! closes it.

pub mod completion;
pub mod engine;
pub mod page;
pub mod registry;
pub mod resolver;

pub use completion::{CompletionStore, JsonFileCache, LocalCache, MemoryCache};
pub use engine::{StepView, TourEngine, TourEvent, TourState};
pub use page::{MountAction, TourMount};
pub use registry::{TourId, TourRegistry, TourStep};
pub use resolver::{AnchorSet, StepTargetResolver};
