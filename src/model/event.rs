// File: ./src/model/event.rs
use crate::model::Resource;
use crate::time_utils;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// Closed set of event categories.
///
/// Deserialization is total: anything the backend sends that is not one of
/// the known names (or no value at all) becomes `General`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EventType {
    Social,
    Academic,
    Workshop,
    #[default]
    General,
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "social" => Self::Social,
            "academic" => Self::Academic,
            "workshop" => Self::Workshop,
            _ => Self::General,
        }
    }

    /// Wire name, as stored by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Academic => "academic",
            Self::Workshop => "workshop",
            Self::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Social => "Social",
            Self::Academic => "Academic",
            Self::Workshop => "Workshop",
            Self::General => "General",
        }
    }

    /// Badge color (green, blue, purple, gray).
    pub fn accent_color(&self) -> &'static str {
        match self {
            Self::Social => "#22C55E",
            Self::Academic => "#3B82F6",
            Self::Workshop => "#A855F7",
            Self::General => "#6B7280",
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Local calendar day, `YYYY-MM-DD` on the wire.
    pub date: NaiveDate,
    /// 12-hour display time, e.g. `"6:30 PM"`.
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub event_type: EventType,
}

/// Create/update payload for an event, kept as the admin typed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub event_type: EventType,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            date: String::new(),
            time: String::new(),
            location: String::new(),
            event_type: EventType::General,
        }
    }
}

impl Resource for Event {
    type Draft = EventDraft;

    const COLLECTION: &'static str = "events";
    const NOUN: &'static str = "event";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.format("%Y-%m-%d").to_string(),
            time: self.time.clone(),
            location: self.location.clone(),
            event_type: self.event_type,
        }
    }

    fn blank_draft(_existing: &[Self]) -> EventDraft {
        EventDraft::default()
    }

    fn validate(draft: &EventDraft) -> Result<(), String> {
        if draft.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        NaiveDate::parse_from_str(draft.date.trim(), "%Y-%m-%d")
            .map_err(|_| format!("Date '{}' is not a YYYY-MM-DD date", draft.date))?;
        time_utils::parse_12h(&draft.time).map_err(|e| e.to_string())?;
        Ok(())
    }
}
