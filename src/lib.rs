//! Finance Guide: onboarding conversation and product tours for the
//! personal-finance dashboard client.

pub mod api;
pub mod config;
pub mod error;
pub mod locale;
pub mod navigation;
pub mod onboarding;
pub mod tours;
