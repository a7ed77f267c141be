//! ConversationController — drives the onboarding chat against the backend.
//!
//! Every network path funnels into the same response application: strip
//! directives, append the agent message, replace the options, expose Google
//! files, and schedule the redirect home once onboarding completes. Transport
//! failures become a localized agent message; nothing is propagated to the
//! caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::OnboardingApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::locale::Locale;
use crate::navigation::{NavigationTarget, Navigator};

use super::model::{TurnResponse, UploadFile};
use super::state::{ConversationState, ConversationView};

/// Result of a user action on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The server answered and its response was applied.
    Applied,
    /// The browser was sent to an external URL.
    Redirected,
    /// Input was blank; nothing happened.
    Rejected,
    /// Another request is still in flight; nothing happened.
    Busy,
    /// The request failed; a fallback message was appended.
    Failed,
}

/// Controller settings derived from [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub redirect_uri: String,
    pub home_route: String,
    pub completion_delay: Duration,
    pub locale: Locale,
}

impl From<&ClientConfig> for ControllerSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            redirect_uri: config.google_redirect_uri.clone(),
            home_route: config.home_route.clone(),
            completion_delay: config.timings.completion_redirect,
            locale: config.locale,
        }
    }
}

/// Owns the onboarding conversation for one mounted onboarding page.
pub struct ConversationController {
    api: Arc<dyn OnboardingApi>,
    navigator: Arc<dyn Navigator>,
    settings: ControllerSettings,
    state: Arc<RwLock<ConversationState>>,
    completion_timer: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationController {
    pub fn new(
        api: Arc<dyn OnboardingApi>,
        navigator: Arc<dyn Navigator>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            api,
            navigator,
            settings,
            state: Arc::new(RwLock::new(ConversationState::default())),
            completion_timer: Mutex::new(None),
        }
    }

    /// Current state for rendering.
    pub async fn view(&self) -> ConversationView {
        self.state.read().await.view()
    }

    /// Fetch the current snapshot and seed the conversation.
    ///
    /// An already-complete onboarding leaves immediately without rendering
    /// anything.
    pub async fn bootstrap(&self) -> TurnOutcome {
        let snapshot = match self.api.fetch_state().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to fetch onboarding state");
                self.state
                    .write()
                    .await
                    .push_agent(self.settings.locale.bootstrap_failed());
                return TurnOutcome::Failed;
            }
        };

        let leave_now = {
            let mut state = self.state.write().await;
            state.apply_snapshot(snapshot) && state.take_completion()
        };
        if leave_now {
            info!("Onboarding already complete, leaving onboarding page");
            self.navigator
                .navigate(NavigationTarget::Route(self.settings.home_route.clone()));
        }
        TurnOutcome::Applied
    }

    /// Send a chat message.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Rejected;
        }
        let Some(guard) = self.begin_request(Some(text.to_string())).await else {
            debug!("Chat turn ignored, request already in flight");
            return TurnOutcome::Busy;
        };

        let result = self.api.send_chat(text).await;
        self.finish_request(guard, result, self.settings.locale.fallback_reply())
            .await
    }

    /// Upload a spreadsheet or statement file.
    pub async fn upload_file(&self, file: UploadFile) -> TurnOutcome {
        if file.file_name.trim().is_empty() {
            return TurnOutcome::Rejected;
        }
        let sending = self.settings.locale.sending_file(&file.file_name);
        let Some(guard) = self.begin_request(Some(sending)).await else {
            debug!("Upload ignored, request already in flight");
            return TurnOutcome::Busy;
        };

        info!(file_name = %file.file_name, bytes = file.bytes.len(), "Uploading onboarding file");
        let result = self.api.upload(file).await;
        self.finish_request(guard, result, self.settings.locale.upload_failed())
            .await
    }

    /// Ask the server for a Google authorization URL and leave the app for it.
    pub async fn start_external_auth(&self) -> TurnOutcome {
        match self.api.google_auth_url(&self.settings.redirect_uri).await {
            Ok(url) => {
                info!("Redirecting to Google authorization");
                self.navigator.navigate(NavigationTarget::External(url));
                TurnOutcome::Redirected
            }
            Err(e) => {
                warn!(error = %e, "Failed to get Google authorization URL");
                self.state
                    .write()
                    .await
                    .push_agent(self.settings.locale.auth_failed());
                TurnOutcome::Failed
            }
        }
    }

    /// Exchange the authorization code the callback page received.
    pub async fn submit_external_auth_code(&self, code: &str) -> TurnOutcome {
        if code.trim().is_empty() {
            return TurnOutcome::Rejected;
        }
        let Some(guard) = self.begin_request(None).await else {
            return TurnOutcome::Busy;
        };

        let result = self
            .api
            .exchange_google_code(code.trim(), &self.settings.redirect_uri)
            .await;
        self.finish_request(guard, result, self.settings.locale.auth_failed())
            .await
    }

    /// Close the Google file picker.
    pub async fn dismiss_google_files(&self) {
        self.state.write().await.clear_google_files();
    }

    /// Cancel the pending redirect, if any. Called when the page unmounts.
    pub fn shutdown(&self) {
        let handle = self
            .completion_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Mark a request in flight and append the optimistic user message.
    /// Returns `None` if another request is still running.
    async fn begin_request(&self, user_message: Option<String>) -> Option<RequestGuard> {
        let mut state = self.state.write().await;
        if !state.begin_request() {
            return None;
        }
        if let Some(text) = user_message {
            state.push_user(text);
        }
        Some(RequestGuard {
            state: Arc::clone(&self.state),
            armed: true,
        })
    }

    async fn finish_request(
        &self,
        mut guard: RequestGuard,
        result: Result<TurnResponse, ApiError>,
        fallback: &str,
    ) -> TurnOutcome {
        let applied = {
            let mut state = self.state.write().await;
            state.finish_request();
            guard.armed = false;
            match result {
                Ok(response) => Some(state.apply_response(response)),
                Err(e) => {
                    warn!(error = %e, "Onboarding request failed");
                    state.push_agent(fallback);
                    None
                }
            }
        };

        match applied {
            Some(applied) => {
                if applied.schedule_completion {
                    self.schedule_completion();
                }
                TurnOutcome::Applied
            }
            None => TurnOutcome::Failed,
        }
    }

    fn schedule_completion(&self) {
        let navigator = Arc::clone(&self.navigator);
        let route = self.settings.home_route.clone();
        let delay = self.settings.completion_delay;
        info!(delay_ms = delay.as_millis() as u64, "Onboarding complete, scheduling redirect");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(NavigationTarget::Route(route));
        });

        let previous = self
            .completion_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

/// Clears the loading flag if a request future is dropped before it finishes.
struct RequestGuard {
    state: Arc<RwLock<ConversationState>>,
    armed: bool,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Onboarding request cancelled before completion");
        if let Ok(mut state) = self.state.try_write() {
            state.finish_request();
            return;
        }
        // Lock briefly held elsewhere. Nothing can start a new request while
        // the flag is still set, so clearing it a moment later is safe.
        let state = Arc::clone(&self.state);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                state.write().await.finish_request();
            });
        }
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
