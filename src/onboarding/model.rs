//! Onboarding data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Agent,
    User,
}

/// A chat message in the onboarding log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Server-reported onboarding status.
///
/// Only `IN_PROGRESS` and `COMPLETE` carry meaning for the client; any other
/// value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OnboardingStatus {
    #[default]
    InProgress,
    Complete,
    Other(String),
}

impl OnboardingStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl From<String> for OnboardingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETE" => Self::Complete,
            _ => Self::Other(raw),
        }
    }
}

impl From<OnboardingStatus> for String {
    fn from(status: OnboardingStatus) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A Google Drive file offered for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleFileRef {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// The server's description of onboarding progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnboardingSnapshot {
    pub state: OnboardingStatus,
    /// 0–100.
    pub progress_percent: u8,
    pub ui_options: Vec<String>,
    pub initial_message: Option<String>,
    pub google_files: Option<Vec<GoogleFileRef>>,
}

/// Reply to a chat turn, upload, or auth-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnResponse {
    pub message: Option<String>,
    pub ui_options: Vec<String>,
    pub state: OnboardingStatus,
    pub progress_percent: Option<u8>,
    pub google_files: Option<Vec<GoogleFileRef>>,
}

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_wire_strings() {
        assert_eq!(
            OnboardingStatus::from("IN_PROGRESS".to_string()),
            OnboardingStatus::InProgress
        );
        assert!(OnboardingStatus::from("COMPLETE".to_string()).is_complete());
        assert_eq!(
            OnboardingStatus::from("AWAITING_IMPORT".to_string()),
            OnboardingStatus::Other("AWAITING_IMPORT".into())
        );
        // Case matters on the wire.
        assert!(!OnboardingStatus::from("complete".to_string()).is_complete());
    }

    #[test]
    fn opaque_status_round_trips_verbatim() {
        let status: OnboardingStatus = serde_json::from_str("\"REVIEWING_BUDGET\"").unwrap();
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"REVIEWING_BUDGET\"");
    }

    #[test]
    fn messages_get_distinct_ids() {
        let a = Message::user("oi");
        let b = Message::user("oi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.sender, Sender::User);
        assert_eq!(Message::agent("olá").sender, Sender::Agent);
    }

    #[test]
    fn upload_file_builder() {
        let f = UploadFile::new("extrato.csv", b"a,b".to_vec()).with_content_type("text/csv");
        assert_eq!(f.file_name, "extrato.csv");
        assert_eq!(f.content_type.as_deref(), Some("text/csv"));
    }
}
