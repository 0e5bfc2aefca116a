//! Quick actions: canned commands bypassing live speech capture
//!
//! Each action maps to exactly one canonical command phrase (submitted to
//! the backend and used as the fallback transcription) and to one locally
//! computable offline response.

use crate::result::Intent;

/// A pre-defined canned command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAction {
    GetTime,
    GetWeather,
    ReadMessages,
    CheckAgenda,
    CallContact,
    CreateReminder,
}

impl QuickAction {
    /// Every action, in display order
    pub const ALL: [Self; 6] = [
        Self::GetTime,
        Self::GetWeather,
        Self::ReadMessages,
        Self::CheckAgenda,
        Self::CallContact,
        Self::CreateReminder,
    ];

    /// Parse a fixed action identifier
    ///
    /// Unmapped identifiers return `None`; callers treat that as a no-op.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "get_time" => Some(Self::GetTime),
            "get_weather" => Some(Self::GetWeather),
            "read_messages" => Some(Self::ReadMessages),
            "check_agenda" => Some(Self::CheckAgenda),
            "call_contact" => Some(Self::CallContact),
            "create_reminder" => Some(Self::CreateReminder),
            _ => None,
        }
    }

    /// The fixed string identifier
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::GetTime => "get_time",
            Self::GetWeather => "get_weather",
            Self::ReadMessages => "read_messages",
            Self::CheckAgenda => "check_agenda",
            Self::CallContact => "call_contact",
            Self::CreateReminder => "create_reminder",
        }
    }

    /// Canonical natural-language phrase submitted to the NLP pipeline
    #[must_use]
    pub const fn command_phrase(self) -> &'static str {
        match self {
            Self::GetTime => "quelle heure est-il",
            Self::GetWeather => "quel temps fait-il aujourd'hui",
            Self::ReadMessages => "lis mes messages",
            Self::CheckAgenda => "qu'est-ce que j'ai de prévu aujourd'hui",
            Self::CallContact => "appeler",
            Self::CreateReminder => "créer un rappel",
        }
    }

    /// Intent assigned to a locally fabricated fallback result
    #[must_use]
    pub const fn intent(self) -> Intent {
        match self {
            Self::GetTime => Intent::GetTime,
            Self::GetWeather => Intent::GetWeather,
            Self::ReadMessages => Intent::ReadMessages,
            Self::CheckAgenda => Intent::CheckAgenda,
            Self::CallContact => Intent::CallContact,
            Self::CreateReminder => Intent::CreateReminder,
        }
    }

    /// Offline response used when the remote call fails
    ///
    /// Pure function of the action and the local clock; no network.
    #[must_use]
    pub fn fallback_response(self) -> String {
        match self {
            Self::GetTime => format!(
                "Il est actuellement {}.",
                chrono::Local::now().format("%H:%M")
            ),
            Self::GetWeather => {
                "Aujourd'hui à Tunis, il fait 22 degrés, le temps est ensoleillé.".to_string()
            }
            Self::ReadMessages => {
                "Impossible de récupérer les messages. Vérifiez votre connexion.".to_string()
            }
            Self::CheckAgenda => {
                "Impossible de récupérer l'agenda. Vérifiez votre connexion.".to_string()
            }
            Self::CallContact => {
                "Qui souhaitez-vous appeler ? Utilisez le microphone pour le dire.".to_string()
            }
            Self::CreateReminder => {
                "Quel rappel souhaitez-vous créer ? Utilisez le microphone pour le dire."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for action in QuickAction::ALL {
            assert_eq!(QuickAction::from_id(action.id()), Some(action));
        }
    }

    #[test]
    fn unmapped_id_is_none() {
        assert_eq!(QuickAction::from_id("add_medication"), None);
        assert_eq!(QuickAction::from_id(""), None);
    }

    #[test]
    fn time_fallback_uses_the_local_clock() {
        let now = chrono::Local::now().format("%H:%M").to_string();
        let response = QuickAction::GetTime.fallback_response();
        assert!(response.starts_with("Il est actuellement"));
        assert!(response.contains(&now));
    }

    #[test]
    fn every_action_has_a_phrase_and_a_fallback() {
        for action in QuickAction::ALL {
            assert!(!action.command_phrase().is_empty());
            assert!(!action.fallback_response().is_empty());
        }
    }
}
