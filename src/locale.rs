//! User-facing strings produced by the client core itself.

use std::str::FromStr;

/// Display language for client-generated chat messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl Locale {
    /// Agent message shown when a chat turn could not reach the server.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            Self::PtBr => {
                "Desculpe, tive um problema para processar sua mensagem. Tente novamente em instantes."
            }
            Self::En => "Sorry, I had trouble processing your message. Please try again shortly.",
        }
    }

    /// Agent message shown when the initial onboarding state could not be loaded.
    pub fn bootstrap_failed(&self) -> &'static str {
        match self {
            Self::PtBr => "Não consegui carregar seu progresso. Verifique sua conexão e tente novamente.",
            Self::En => "I couldn't load your progress. Check your connection and try again.",
        }
    }

    /// Agent message shown when a file upload failed.
    pub fn upload_failed(&self) -> &'static str {
        match self {
            Self::PtBr => "Não consegui enviar o arquivo. Tente novamente.",
            Self::En => "I couldn't upload the file. Please try again.",
        }
    }

    /// Agent message shown when the Google authorization round-trip failed.
    pub fn auth_failed(&self) -> &'static str {
        match self {
            Self::PtBr => "Não foi possível conectar ao Google Drive. Tente novamente.",
            Self::En => "Couldn't connect to Google Drive. Please try again.",
        }
    }

    /// Optimistic user message appended while a file is uploading.
    pub fn sending_file(&self, file_name: &str) -> String {
        match self {
            Self::PtBr => format!("📎 Enviando {file_name}..."),
            Self::En => format!("📎 Sending {file_name}..."),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" | "pt" => Ok(Self::PtBr),
            "en" | "en-us" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PtBr => write!(f, "pt-BR"),
            Self::En => write!(f, "en"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("pt-BR".parse::<Locale>().unwrap(), Locale::PtBr);
        assert_eq!("pt_br".parse::<Locale>().unwrap(), Locale::PtBr);
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn display_parses_back() {
        for locale in [Locale::PtBr, Locale::En] {
            assert_eq!(locale.to_string().parse::<Locale>().unwrap(), locale);
        }
    }

    #[test]
    fn sending_file_names_the_file() {
        assert!(Locale::PtBr.sending_file("extrato.csv").contains("extrato.csv"));
        assert!(Locale::En.sending_file("a.xlsx").starts_with("📎 Sending"));
    }
}
