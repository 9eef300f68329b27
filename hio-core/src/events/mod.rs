//! Export view of an enriched catalog: a browsable directory tree plus the
//! concrete calendar events behind each of its leaves

mod directory;
mod recurrence;

pub use directory::expand_events;
pub use recurrence::{NO_ROOM_GIVEN, expand_parallel_group};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Directory {
    pub name: String,
    pub sub_directories: Vec<Directory>,
    pub events: Vec<DirectoryEvent>,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_directories: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sub_directories.is_empty() && self.events.is_empty()
    }
}

/// Leaf entry of the directory tree, pointing at `<id>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirectoryEvent {
    pub id: String,
    pub name: String,
}

/// One concrete occurrence, in local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Everything one run exports
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    /// One directory per faculty
    pub directories: Vec<Directory>,
    /// Occurrences keyed by event id, one entry per directory leaf
    pub events: BTreeMap<String, Vec<Event>>,
}
