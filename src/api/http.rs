//! reqwest-backed implementation of the onboarding and tour-sync endpoints.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::wire::{AuthCodeRequest, AuthUrlBody, ChatRequest, SeenToursBody, StateBody, TurnBody};
use super::{OnboardingApi, TourSyncApi};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::onboarding::model::{OnboardingSnapshot, TurnResponse, UploadFile};

/// HTTP client for the finance REST backend.
pub struct HttpBackend {
    base_url: String,
    token: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and check the status, returning the raw response.
    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), "Backend returned an error status");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, request).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl OnboardingApi for HttpBackend {
    async fn fetch_state(&self) -> Result<OnboardingSnapshot, ApiError> {
        let endpoint = "/onboarding/state";
        let body: StateBody = self
            .send_json(endpoint, self.client.get(self.url(endpoint)))
            .await?;
        Ok(body.into())
    }

    async fn send_chat(&self, text: &str) -> Result<TurnResponse, ApiError> {
        let endpoint = "/onboarding/chat";
        let request = self.client.post(self.url(endpoint)).json(&ChatRequest { text });
        let body: TurnBody = self.send_json(endpoint, request).await?;
        Ok(body.into())
    }

    async fn upload(&self, file: UploadFile) -> Result<TurnResponse, ApiError> {
        let endpoint = "/onboarding/upload";
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type).map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                reason: format!("invalid content type {content_type}: {e}"),
            })?;
        }
        let form = Form::new().part("file", part);
        let request = self.client.post(self.url(endpoint)).multipart(form);
        let body: TurnBody = self.send_json(endpoint, request).await?;
        Ok(body.into())
    }

    async fn google_auth_url(&self, redirect_uri: &str) -> Result<String, ApiError> {
        let endpoint = "/onboarding/google-auth-url";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("redirect_uri", redirect_uri)]);
        let body: AuthUrlBody = self.send_json(endpoint, request).await?;
        if body.url.trim().is_empty() {
            return Err(ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: "empty authorization URL".to_string(),
            });
        }
        Ok(body.url)
    }

    async fn exchange_google_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TurnResponse, ApiError> {
        let endpoint = "/onboarding/google-auth";
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&AuthCodeRequest { code, redirect_uri });
        let body: TurnBody = self.send_json(endpoint, request).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl TourSyncApi for HttpBackend {
    async fn fetch_seen_tours(&self) -> Result<Vec<String>, ApiError> {
        let endpoint = "/telemetry/tours";
        let body: SeenToursBody = self
            .send_json(endpoint, self.client.get(self.url(endpoint)))
            .await?;
        Ok(body.seen_tours)
    }

    async fn mark_tour_seen(&self, tour_id: &str) -> Result<(), ApiError> {
        let endpoint = format!("/telemetry/tours/{tour_id}");
        self.send(&endpoint, self.client.post(self.url(&endpoint)))
            .await?;
        Ok(())
    }

    async fn clear_seen_tours(&self) -> Result<(), ApiError> {
        let endpoint = "/telemetry/tours";
        self.send(endpoint, self.client.delete(self.url(endpoint)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            ..Default::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let b = backend("https://api.example.com/");
        assert_eq!(
            b.url("/onboarding/state"),
            "https://api.example.com/onboarding/state"
        );
    }

    // ── Network error tests (nothing listens on the port) ───────────

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let b = backend("http://127.0.0.1:9");
        let err = b.send_chat("oi").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }), "got {err}");
        assert_eq!(err.endpoint(), Some("/onboarding/chat"));
    }

    #[tokio::test]
    async fn unreachable_tour_sync_is_a_transport_error() {
        let b = backend("http://127.0.0.1:9");
        assert!(b.fetch_seen_tours().await.is_err());
        assert!(b.mark_tour_seen("welcome").await.is_err());
    }
}
