//! `[UI_ACTION:...]` directive parsing for agent messages.
//!
//! The onboarding agent embeds render instructions in its free-text replies,
//! e.g. `Escolha: [UI_ACTION:upload] 📤 Enviar Planilha`. A directive is the
//! bracketed tag plus the inline label that follows it on the same line.
//! Directives are never shown to the user.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[UI_ACTION:(.*?)\]").expect("directive pattern is valid"));

/// A directive found in an agent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Tag payload, e.g. `upload`.
    pub action: String,
    /// Inline text after the tag, up to the next tag or end of line.
    pub label: String,
}

/// Remove every directive from `text` and trim the result.
///
/// A line is cut at its first tag. Lines left blank by the cut are dropped.
/// Callers must not display an empty result.
pub fn strip(text: &str) -> String {
    text.lines()
        .filter_map(|line| match TAG.find(line) {
            Some(tag) => {
                let kept = line[..tag.start()].trim_end();
                (!kept.trim().is_empty()).then_some(kept)
            }
            None => Some(line.trim_end()),
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Directives in `text`, in order of appearance.
pub fn extract(text: &str) -> Vec<Directive> {
    let mut found = Vec::new();
    for line in text.lines() {
        let tags: Vec<_> = TAG.captures_iter(line).collect();
        for (i, caps) in tags.iter().enumerate() {
            let (Some(whole), Some(payload)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let label_end = tags
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(line.len());
            found.push(Directive {
                action: payload.as_str().trim().to_string(),
                label: line[whole.end()..label_end].trim().to_string(),
            });
        }
    }
    found
}

/// Whether `text` carries at least one directive.
pub fn has_directives(text: &str) -> bool {
    TAG.is_match(text)
}
