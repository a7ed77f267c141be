//! Wire shapes of the REST backend.
//!
//! Server field names stay in this module. Everything is converted into the
//! onboarding model types before leaving the API layer.

use serde::{Deserialize, Deserializer, Serialize};

use crate::onboarding::model::{GoogleFileRef, OnboardingSnapshot, OnboardingStatus, TurnResponse};

/// Google Drive file as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGoogleFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "webViewLink", default)]
    pub web_view_link: String,
    #[serde(rename = "iconLink", default)]
    pub icon_link: Option<String>,
}

impl RawGoogleFile {
    fn into_ref(self) -> Option<GoogleFileRef> {
        if self.id.is_empty() {
            return None;
        }
        Some(GoogleFileRef {
            id: self.id,
            name: self.name,
            url: self.web_view_link,
            icon: self.icon_link.filter(|s| !s.is_empty()),
        })
    }
}

/// GET `/onboarding/state` body.
#[derive(Debug, Clone, Deserialize)]
pub struct StateBody {
    #[serde(default)]
    pub state: OnboardingStatus,
    #[serde(default, alias = "progress", deserialize_with = "lenient_percent")]
    pub progress_percent: Option<u8>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub ui_options: Vec<String>,
    #[serde(default)]
    pub initial_message: Option<String>,
    #[serde(default)]
    pub google_files_list: Option<Vec<RawGoogleFile>>,
}

impl From<StateBody> for OnboardingSnapshot {
    fn from(body: StateBody) -> Self {
        Self {
            state: body.state,
            progress_percent: body.progress_percent.unwrap_or(0),
            ui_options: body.ui_options,
            initial_message: body.initial_message.filter(|m| !m.trim().is_empty()),
            google_files: map_files(body.google_files_list),
        }
    }
}

/// Body returned by chat, upload, and auth-code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub ui_options: Vec<String>,
    #[serde(default)]
    pub state: OnboardingStatus,
    #[serde(default, alias = "progress", deserialize_with = "lenient_percent")]
    pub progress_percent: Option<u8>,
    #[serde(default)]
    pub google_files_list: Option<Vec<RawGoogleFile>>,
}

impl From<TurnBody> for TurnResponse {
    fn from(body: TurnBody) -> Self {
        Self {
            message: body.message,
            ui_options: body.ui_options,
            state: body.state,
            progress_percent: body.progress_percent,
            google_files: map_files(body.google_files_list),
        }
    }
}

/// POST `/onboarding/chat` request.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub text: &'a str,
}

/// POST `/onboarding/google-auth` request.
#[derive(Debug, Serialize)]
pub struct AuthCodeRequest<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
}

/// GET `/onboarding/google-auth-url` body.
#[derive(Debug, Deserialize)]
pub struct AuthUrlBody {
    pub url: String,
}

/// GET `/telemetry/tours` body.
#[derive(Debug, Deserialize)]
pub struct SeenToursBody {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub seen_tours: Vec<String>,
}

fn map_files(files: Option<Vec<RawGoogleFile>>) -> Option<Vec<GoogleFileRef>> {
    files.map(|files| files.into_iter().filter_map(RawGoogleFile::into_ref).collect())
}

/// Accept a missing, null, or malformed list as empty; drop non-string items.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Accept integer or float percentages, clamped to 0–100.
fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .map(|p| p.clamp(0.0, 100.0).round() as u8))
}
