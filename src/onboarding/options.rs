//! Option classification: maps a server-provided option label to a client
//! intent.
//!
//! The server sends option buttons as plain labels. Intent is recovered from
//! the label text with a cue table evaluated in priority order; the first
//! matching row wins. When the agent message carried a `[UI_ACTION:<intent>]`
//! directive for the same label, that structured hint takes precedence.

use serde::Serialize;

/// What pressing an option means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionIntent {
    Upload,
    ExternalAuth,
    FreshStart,
    Confirm,
    Reply,
}

impl OptionIntent {
    /// Parse a directive payload. Unknown payloads yield `None`.
    pub fn from_directive(action: &str) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "upload" | "upload_file" | "spreadsheet" => Some(Self::Upload),
            "google" | "google_auth" | "google_drive" | "external_auth" => {
                Some(Self::ExternalAuth)
            }
            "fresh_start" | "start_fresh" | "from_scratch" => Some(Self::FreshStart),
            "confirm" => Some(Self::Confirm),
            "reply" | "message" => Some(Self::Reply),
            _ => None,
        }
    }
}

/// Icon shown on the option control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionIcon {
    Upload,
    Cloud,
    Sparkles,
    Check,
    Chat,
}

/// Visual emphasis of the option control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionStyle {
    Primary,
    Secondary,
    Success,
    Outline,
}

/// Client behaviour bound to an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum OptionAction {
    /// Open the file picker and upload the chosen file.
    OpenFilePicker,
    /// Start the Google Drive authorization round-trip.
    StartExternalAuth,
    /// Send the text back as a chat message.
    SendMessage(String),
}

/// A classified option, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedOption {
    pub label: String,
    pub intent: OptionIntent,
    pub icon: OptionIcon,
    pub style: OptionStyle,
    pub action: OptionAction,
}

/// Cue table, highest priority first. Matching is case-sensitive containment.
const CUES: &[(OptionIntent, &[&str])] = &[
    (OptionIntent::Upload, &["📤", "Planilha", "Upload"]),
    (OptionIntent::ExternalAuth, &["☁", "Google"]),
    (OptionIntent::FreshStart, &["🆕", "Começar do zero", "do zero"]),
    (OptionIntent::Confirm, &["✅", "Confirmar", "Tudo certo"]),
];

/// Intent recovered from label text alone.
pub fn intent_for_label(label: &str) -> OptionIntent {
    CUES.iter()
        .find(|(_, cues)| cues.iter().any(|cue| label.contains(cue)))
        .map(|(intent, _)| *intent)
        .unwrap_or(OptionIntent::Reply)
}

/// Classify an option label using the cue table.
pub fn classify(label: &str) -> ClassifiedOption {
    build(label, intent_for_label(label))
}

/// Classify an option label, preferring a structured hint when it names a
/// known intent.
pub fn classify_with_hint(label: &str, hint: Option<&str>) -> ClassifiedOption {
    let intent = hint
        .and_then(OptionIntent::from_directive)
        .unwrap_or_else(|| intent_for_label(label));
    build(label, intent)
}

fn build(label: &str, intent: OptionIntent) -> ClassifiedOption {
    let (icon, style, action) = match intent {
        OptionIntent::Upload => (
            OptionIcon::Upload,
            OptionStyle::Primary,
            OptionAction::OpenFilePicker,
        ),
        OptionIntent::ExternalAuth => (
            OptionIcon::Cloud,
            OptionStyle::Secondary,
            OptionAction::StartExternalAuth,
        ),
        OptionIntent::FreshStart => (
            OptionIcon::Sparkles,
            OptionStyle::Outline,
            OptionAction::SendMessage(label.to_string()),
        ),
        OptionIntent::Confirm => (
            OptionIcon::Check,
            OptionStyle::Success,
            OptionAction::SendMessage(label.to_string()),
        ),
        OptionIntent::Reply => (
            OptionIcon::Chat,
            OptionStyle::Outline,
            OptionAction::SendMessage(label.to_string()),
        ),
    };
    ClassifiedOption {
        label: label.to_string(),
        intent,
        icon,
        style,
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_and_drive_options() {
        let upload = classify("📤 Enviar Planilha");
        assert_eq!(upload.intent, OptionIntent::Upload);
        assert_eq!(upload.action, OptionAction::OpenFilePicker);

        let drive = classify("☁️ Google Drive");
        assert_eq!(drive.intent, OptionIntent::ExternalAuth);
        assert_eq!(drive.action, OptionAction::StartExternalAuth);
        assert_eq!(drive.icon, OptionIcon::Cloud);
    }

    #[test]
    fn fresh_start_and_confirm() {
        assert_eq!(classify("🆕 Começar do zero").intent, OptionIntent::FreshStart);
        assert_eq!(classify("Quero começar do zero").intent, OptionIntent::FreshStart);
        assert_eq!(classify("✅ Confirmar").intent, OptionIntent::Confirm);
        assert_eq!(
            classify("Tudo certo!").action,
            OptionAction::SendMessage("Tudo certo!".into())
        );
    }

    #[test]
    fn default_sends_label_back() {
        let opt = classify("Prefiro outro banco");
        assert_eq!(opt.intent, OptionIntent::Reply);
        assert_eq!(
            opt.action,
            OptionAction::SendMessage("Prefiro outro banco".into())
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(classify("planilha").intent, OptionIntent::Reply);
        assert_eq!(classify("google").intent, OptionIntent::Reply);
    }

    #[test]
    fn earlier_cue_wins_on_overlap() {
        // Matches both upload and external-auth cues.
        assert_eq!(classify("Planilha do Google").intent, OptionIntent::Upload);
        // Matches both external-auth and confirm cues.
        assert_eq!(classify("✅ Google conectado").intent, OptionIntent::ExternalAuth);
    }

    #[test]
    fn classify_is_total() {
        for label in ["", " ", "☁", "📤", "[UI_ACTION:x]", "\u{0}", "ção"] {
            let opt = classify(label);
            assert_eq!(opt.label, label);
        }
    }

    #[test]
    fn hint_overrides_heuristics() {
        let opt = classify_with_hint("Conectar conta", Some("google_auth"));
        assert_eq!(opt.intent, OptionIntent::ExternalAuth);

        let opt = classify_with_hint("📤 Enviar Planilha", Some("confirm"));
        assert_eq!(opt.intent, OptionIntent::Confirm);
    }

    #[test]
    fn unknown_hint_falls_back() {
        let opt = classify_with_hint("📤 Enviar Planilha", Some("teleport"));
        assert_eq!(opt.intent, OptionIntent::Upload);
        assert_eq!(classify_with_hint("Oi", None).intent, OptionIntent::Reply);
    }

    #[test]
    fn action_serializes_tagged() {
        let json = serde_json::to_value(OptionAction::SendMessage("Sim".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "send_message", "text": "Sim"}));
        let json = serde_json::to_value(OptionAction::OpenFilePicker).unwrap();
        assert_eq!(json, serde_json::json!({"type": "open_file_picker"}));
    }
}
