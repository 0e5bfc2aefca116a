//! Canonical interaction outcome types
//!
//! One [`InteractionResult`] is produced per interaction attempt (voice,
//! quick action, or emergency). It is immutable once constructed and fully
//! replaces the previous one.

use serde::{Deserialize, Serialize};

/// Transcription placeholder when nothing was understood
pub const TRANSCRIPTION_SENTINEL: &str = "—";

/// Displayed when a successful reply carried no usable text field
pub const NO_RESPONSE_TEXT: &str = "Je n'ai pas de réponse pour le moment.";

/// Displayed when a failed reply carried no usable text field
pub const FAILED_ACTION_TEXT: &str =
    "Je n'ai pas pu exécuter cette action. Veuillez réessayer.";

/// Categorical classification of what the user asked for
///
/// Assigned by the remote NLP service or by local fallback logic. Unknown
/// wire tags deserialize to [`Intent::Unknown`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    GetTime,
    GetWeather,
    ReadMessages,
    SendMessage,
    CheckAgenda,
    CallContact,
    CreateReminder,
    AddMedication,
    SetAlarm,
    EmergencyAlert,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// Badge label shown next to a result
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GetTime => "🕐 Heure",
            Self::GetWeather => "🌤️ Météo",
            Self::ReadMessages => "💬 Messages",
            Self::SendMessage => "✉️ Message envoyé",
            Self::CheckAgenda => "📅 Agenda",
            Self::CallContact => "📞 Appel contact",
            Self::CreateReminder => "⏰ Rappel créé",
            Self::AddMedication => "💊 Médicament",
            Self::SetAlarm => "⏰ Alarme",
            Self::EmergencyAlert => "🚨 URGENCE",
            Self::Unknown => "❓ Non compris",
            Self::Error => "⚠️ Erreur",
        }
    }
}

/// Direction of a relayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Sent,
    #[default]
    #[serde(other)]
    Received,
}

/// One entry of a structured message-list payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Whether the message was received or sent
    #[serde(default)]
    pub direction: MessageDirection,

    /// Display name of the correspondent
    #[serde(default, alias = "from", alias = "contact_name")]
    pub sender: String,

    /// Message body
    #[serde(default)]
    pub content: String,
}

/// The canonical outcome of one interaction attempt
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    /// Whether the attempt succeeded
    pub success: bool,

    /// Detected (or locally assigned) intent
    pub intent: Intent,

    /// Best-effort record of what was understood
    pub transcription: String,

    /// The reply shown and spoken, resolved by fixed priority
    pub response_text: String,

    /// Recognition confidence in [0, 1]; absent hides the badge
    pub confidence: Option<f32>,

    /// Structured message list, when the reply carried one
    pub messages: Vec<MessageEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_round_trips_wire_tags() {
        let parsed: Intent = serde_json::from_str("\"emergency_alert\"").unwrap();
        assert_eq!(parsed, Intent::EmergencyAlert);

        let json = serde_json::to_string(&Intent::GetTime).unwrap();
        assert_eq!(json, "\"get_time\"");
    }

    #[test]
    fn unknown_wire_tag_parses_defensively() {
        let parsed: Intent = serde_json::from_str("\"order_groceries\"").unwrap();
        assert_eq!(parsed, Intent::Unknown);
    }

    #[test]
    fn message_entry_accepts_sender_aliases() {
        let a: MessageEntry =
            serde_json::from_str(r#"{"direction":"received","from":"Mohamed","content":"salut"}"#)
                .unwrap();
        assert_eq!(a.sender, "Mohamed");

        let b: MessageEntry =
            serde_json::from_str(r#"{"direction":"sent","contact_name":"Fatma","content":"ok"}"#)
                .unwrap();
        assert_eq!(b.sender, "Fatma");
        assert_eq!(b.direction, MessageDirection::Sent);
    }
}
