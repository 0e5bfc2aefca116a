//! Dashboard panel data
//!
//! The display panels fetch their own data independently of the interaction
//! core: four parallel GETs, refetched whenever the orchestrator's refresh
//! counter ticks. A failing panel degrades to empty rather than failing the
//! whole overview.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::result::MessageEntry;

/// A scheduled reminder
#[derive(Debug, Clone, Deserialize)]
pub struct Reminder {
    pub title: String,
    #[serde(default)]
    pub reminder_time: String,
    #[serde(default)]
    pub is_done: bool,
}

/// A medication entry
#[derive(Debug, Clone, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub schedule_time: String,
}

/// A contact entry
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub is_emergency: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ReminderList {
    #[serde(default)]
    reminders: Vec<Reminder>,
}

#[derive(Debug, Default, Deserialize)]
struct MedicationList {
    #[serde(default)]
    medications: Vec<Medication>,
}

#[derive(Debug, Default, Deserialize)]
struct ContactList {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageEntry>,
}

/// One round of panel data
#[derive(Debug, Default)]
pub struct DashboardOverview {
    pub reminders: Vec<Reminder>,
    pub medications: Vec<Medication>,
    pub contacts: Vec<Contact>,
    pub messages: Vec<MessageEntry>,
}

/// Fetches the dashboard panels from the assistant backend
pub struct DashboardClient {
    client: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    /// Create a dashboard client for the given backend base URL
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch all panels concurrently
    ///
    /// Individual panel failures are logged and yield empty lists; there is
    /// no ordering requirement between the fetches.
    pub async fn fetch_overview(&self) -> DashboardOverview {
        let (reminders, medications, contacts, messages) = futures::join!(
            self.get::<ReminderList>("/api/reminders"),
            self.get::<MedicationList>("/api/medications"),
            self.get::<ContactList>("/api/contacts"),
            self.get::<MessageList>("/api/messages"),
        );

        DashboardOverview {
            reminders: panel("reminders", reminders).reminders,
            medications: panel("medications", medications).medications,
            contacts: panel("contacts", contacts).contacts,
            messages: panel("messages", messages).messages,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Unwrap a panel fetch, degrading to the empty default on failure
fn panel<T: Default>(name: &str, fetched: Result<T>) -> T {
    fetched.unwrap_or_else(|e| {
        tracing::warn!(panel = name, error = %e, "panel fetch failed");
        T::default()
    })
}
