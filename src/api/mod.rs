//! Remote REST surface consumed by the client core.
//!
//! The controller and the completion store only see the traits defined here;
//! `HttpBackend` is the reqwest implementation used in production.

pub mod http;
pub mod wire;

pub use http::HttpBackend;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::onboarding::model::{OnboardingSnapshot, TurnResponse, UploadFile};

/// Onboarding endpoints.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// GET `/onboarding/state`.
    async fn fetch_state(&self) -> Result<OnboardingSnapshot, ApiError>;

    /// POST `/onboarding/chat` with the raw user text.
    async fn send_chat(&self, text: &str) -> Result<TurnResponse, ApiError>;

    /// POST `/onboarding/upload` as multipart form data.
    async fn upload(&self, file: UploadFile) -> Result<TurnResponse, ApiError>;

    /// GET `/onboarding/google-auth-url`. Returns the authorization URL.
    async fn google_auth_url(&self, redirect_uri: &str) -> Result<String, ApiError>;

    /// POST `/onboarding/google-auth` to exchange an authorization code.
    async fn exchange_google_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TurnResponse, ApiError>;
}

/// Remote copy of the completed-tours set.
#[async_trait]
pub trait TourSyncApi: Send + Sync {
    /// GET `/telemetry/tours`. Raw ids, unknown ones included.
    async fn fetch_seen_tours(&self) -> Result<Vec<String>, ApiError>;

    /// POST `/telemetry/tours/{tour_id}`.
    async fn mark_tour_seen(&self, tour_id: &str) -> Result<(), ApiError>;

    /// DELETE `/telemetry/tours`.
    async fn clear_seen_tours(&self) -> Result<(), ApiError>;
}
