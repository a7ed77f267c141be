//! Conversation state: the client's mirror of the server-driven onboarding.
//!
//! The server owns the onboarding phase. This state only records what the
//! latest response said; every mutation goes through the methods below so the
//! log stays append-only and the option set is always replaced, never merged.

use std::collections::HashMap;

use serde::Serialize;

use super::directives;
use super::model::{GoogleFileRef, Message, OnboardingSnapshot, OnboardingStatus, TurnResponse};
use super::options::{ClassifiedOption, classify_with_hint};

/// What applying a server response changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    /// An agent message was appended.
    pub appended: bool,
    /// The response completed onboarding for the first time; the caller
    /// should schedule the redirect.
    pub schedule_completion: bool,
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub messages: Vec<Message>,
    pub options: Vec<ClassifiedOption>,
    pub loading: bool,
    pub google_files: Option<Vec<GoogleFileRef>>,
    pub progress_percent: u8,
    pub status: OnboardingStatus,
}

/// Onboarding chat state.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    ui_options: Vec<String>,
    /// Option label → directive payload, from the latest agent message.
    option_hints: HashMap<String, String>,
    loading: bool,
    google_files: Option<Vec<GoogleFileRef>>,
    status: OnboardingStatus,
    progress_percent: u8,
    completion_signalled: bool,
}

impl ConversationState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn ui_options(&self) -> &[String] {
        &self.ui_options
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn google_files(&self) -> Option<&[GoogleFileRef]> {
        self.google_files.as_deref()
    }

    pub fn status(&self) -> &OnboardingStatus {
        &self.status
    }

    #[cfg(test)]
    fn completion_signalled(&self) -> bool {
        self.completion_signalled
    }

    /// Mark a request as in flight. Returns false if one already is.
    pub fn begin_request(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn finish_request(&mut self) {
        self.loading = false;
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.messages.push(Message::agent(text));
    }

    /// Close the Google file picker.
    pub fn clear_google_files(&mut self) {
        self.google_files = None;
    }

    /// Take the first completion signal. Later calls return false.
    pub fn take_completion(&mut self) -> bool {
        if self.completion_signalled {
            return false;
        }
        self.completion_signalled = true;
        true
    }

    /// Seed state from the initial snapshot.
    ///
    /// Returns true when the snapshot says onboarding is already complete;
    /// in that case nothing else is touched.
    pub fn apply_snapshot(&mut self, snapshot: OnboardingSnapshot) -> bool {
        self.status = snapshot.state;
        if self.status.is_complete() {
            return true;
        }

        self.progress_percent = snapshot.progress_percent.min(100);
        self.ui_options = snapshot.ui_options;
        self.option_hints.clear();

        if let Some(initial) = snapshot.initial_message.filter(|_| self.messages.is_empty()) {
            self.option_hints = hints_from(&initial);
            let cleaned = directives::strip(&initial);
            if !cleaned.is_empty() {
                self.push_agent(cleaned);
            }
        }

        if let Some(files) = snapshot.google_files.filter(|f| !f.is_empty()) {
            self.google_files = Some(files);
        }
        false
    }

    /// Apply a chat, upload, or auth-exchange response.
    pub fn apply_response(&mut self, response: TurnResponse) -> Applied {
        let mut applied = Applied::default();

        self.option_hints.clear();
        if let Some(message) = response.message {
            self.option_hints = hints_from(&message);
            let cleaned = directives::strip(&message);
            if !cleaned.is_empty() {
                self.push_agent(cleaned);
                applied.appended = true;
            }
        }

        self.ui_options = response.ui_options;

        if let Some(files) = response.google_files.filter(|f| !f.is_empty()) {
            self.google_files = Some(files);
        }

        if let Some(progress) = response.progress_percent {
            self.progress_percent = progress.min(100);
        }

        self.status = response.state;
        if self.status.is_complete() {
            applied.schedule_completion = self.take_completion();
        }

        applied
    }

    /// Options classified for rendering.
    pub fn classified_options(&self) -> Vec<ClassifiedOption> {
        self.ui_options
            .iter()
            .map(|label| {
                classify_with_hint(label, self.option_hints.get(label).map(String::as_str))
            })
            .collect()
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            messages: self.messages.clone(),
            options: self.classified_options(),
            loading: self.loading,
            google_files: self.google_files.clone(),
            progress_percent: self.progress_percent,
            status: self.status.clone(),
        }
    }
}

fn hints_from(message: &str) -> HashMap<String, String> {
    directives::extract(message)
        .into_iter()
        .filter(|d| !d.label.is_empty())
        .map(|d| (d.label, d.action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::Sender;
    use crate::onboarding::options::OptionIntent;

    fn turn(message: Option<&str>, options: &[&str], state: &str) -> TurnResponse {
        TurnResponse {
            message: message.map(String::from),
            ui_options: options.iter().map(|s| s.to_string()).collect(),
            state: OnboardingStatus::from(state.to_string()),
            progress_percent: None,
            google_files: None,
        }
    }

    #[test]
    fn spreadsheet_choice_scenario() {
        let mut state = ConversationState::default();
        let applied = state.apply_response(turn(
            Some("Escolha: [UI_ACTION:upload] 📤 Enviar Planilha"),
            &["📤 Enviar Planilha", "☁️ Google Drive"],
            "IN_PROGRESS",
        ));

        assert!(applied.appended);
        assert!(!applied.schedule_completion);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].text, "Escolha:");
        assert_eq!(state.messages()[0].sender, Sender::Agent);

        let options = state.classified_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].intent, OptionIntent::Upload);
        assert_eq!(options[1].intent, OptionIntent::ExternalAuth);
    }

    #[test]
    fn directive_hint_applies_to_matching_label() {
        let mut state = ConversationState::default();
        state.apply_response(turn(
            Some("Pronto?\n[UI_ACTION:confirm] Pode seguir"),
            &["Pode seguir", "Ainda não"],
            "IN_PROGRESS",
        ));
        let options = state.classified_options();
        assert_eq!(options[0].intent, OptionIntent::Confirm);
        assert_eq!(options[1].intent, OptionIntent::Reply);
    }

    #[test]
    fn hints_do_not_outlive_their_turn() {
        let mut state = ConversationState::default();
        state.apply_response(turn(
            Some("[UI_ACTION:confirm] Pode seguir"),
            &["Pode seguir"],
            "IN_PROGRESS",
        ));
        state.apply_response(turn(Some("Certo."), &["Pode seguir"], "IN_PROGRESS"));
        assert_eq!(state.classified_options()[0].intent, OptionIntent::Reply);
    }

    #[test]
    fn directive_only_message_is_not_appended() {
        let mut state = ConversationState::default();
        let applied = state.apply_response(turn(
            Some("[UI_ACTION:upload] 📤 Enviar Planilha"),
            &[],
            "IN_PROGRESS",
        ));
        assert!(!applied.appended);
        assert!(state.messages().is_empty());
    }

    #[test]
    fn options_are_replaced_not_merged() {
        let mut state = ConversationState::default();
        state.apply_response(turn(None, &["A", "B"], "IN_PROGRESS"));
        state.apply_response(turn(None, &["C"], "IN_PROGRESS"));
        assert_eq!(state.ui_options(), ["C".to_string()]);
        state.apply_response(turn(None, &[], "IN_PROGRESS"));
        assert!(state.ui_options().is_empty());
    }

    #[test]
    fn completion_is_signalled_once() {
        let mut state = ConversationState::default();
        let first = state.apply_response(turn(Some("Tudo pronto!"), &[], "COMPLETE"));
        let second = state.apply_response(turn(Some("Até já"), &[], "COMPLETE"));
        assert!(first.schedule_completion);
        assert!(!second.schedule_completion);
        assert!(state.completion_signalled());
    }

    #[test]
    fn google_files_exposed_only_when_non_empty() {
        let mut state = ConversationState::default();
        let mut response = turn(None, &[], "IN_PROGRESS");
        response.google_files = Some(vec![]);
        state.apply_response(response);
        assert!(state.google_files().is_none());

        let mut response = turn(None, &[], "IN_PROGRESS");
        response.google_files = Some(vec![GoogleFileRef {
            id: "1".into(),
            name: "Gastos 2024".into(),
            url: "https://docs.google.com/spreadsheets/d/1".into(),
            icon: None,
        }]);
        state.apply_response(response);
        assert_eq!(state.google_files().map(|f| f.len()), Some(1));
        // Files are a picker signal, not chat content.
        assert!(state.messages().is_empty());

        state.clear_google_files();
        assert!(state.google_files().is_none());
    }

    #[test]
    fn snapshot_seeds_initial_message_only_into_empty_log() {
        let snapshot = OnboardingSnapshot {
            state: OnboardingStatus::InProgress,
            progress_percent: 10,
            ui_options: vec!["Vamos lá".into()],
            initial_message: Some("Olá! Vamos organizar suas finanças.".into()),
            google_files: None,
        };

        let mut state = ConversationState::default();
        assert!(!state.apply_snapshot(snapshot.clone()));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.ui_options(), ["Vamos lá".to_string()]);

        state.push_user("oi");
        state.apply_snapshot(snapshot);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn complete_snapshot_touches_nothing_else() {
        let mut state = ConversationState::default();
        let done = state.apply_snapshot(OnboardingSnapshot {
            state: OnboardingStatus::Complete,
            progress_percent: 100,
            ui_options: vec!["x".into()],
            initial_message: Some("não mostrar".into()),
            google_files: None,
        });
        assert!(done);
        assert!(state.messages().is_empty());
        assert!(state.ui_options().is_empty());
    }

    #[test]
    fn begin_request_blocks_second_request() {
        let mut state = ConversationState::default();
        assert!(state.begin_request());
        assert!(!state.begin_request());
        state.finish_request();
        assert!(!state.is_loading());
        assert!(state.begin_request());
    }

    #[test]
    fn progress_is_clamped() {
        let mut state = ConversationState::default();
        let mut response = turn(None, &[], "IN_PROGRESS");
        response.progress_percent = Some(140);
        state.apply_response(response);
        assert_eq!(state.view().progress_percent, 100);
    }
}
