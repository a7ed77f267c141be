//! Guided onboarding: a server-driven conversation mirrored on the client.
//!
//! The backend decides the onboarding phase and what to ask next. The client
//! keeps the message log, renders the option buttons it was given, and reacts
//! to the reported status. Agent messages may carry `[UI_ACTION:...]`
//! directives, which are stripped before display and used as structured
//! intent hints for the options.

pub mod controller;
pub mod directives;
pub mod model;
pub mod options;
pub mod state;

pub use controller::{ControllerSettings, ConversationController, TurnOutcome};
pub use directives::{Directive, extract, strip};
pub use model::{
    GoogleFileRef, Message, OnboardingSnapshot, OnboardingStatus, Sender, TurnResponse, UploadFile,
};
pub use options::{ClassifiedOption, OptionAction, OptionIcon, OptionIntent, OptionStyle, classify};
pub use state::{ConversationState, ConversationView};
