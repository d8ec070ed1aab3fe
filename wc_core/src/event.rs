//! The event record handed out to callers.

use serde::Serialize;

pub static DEFAULT_SUMMARY: &str = "No Summary";

/// A single calendar event.
///
/// `start` and `end` hold ISO-8601 text: a date (`2024-02-10`), a naive
/// timestamp (`2024-02-10T09:00:00`) or a UTC timestamp
/// (`2024-02-10T09:00:00+00:00`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: String,
    pub description: String,
}

impl Default for CalendarEvent {
    fn default() -> Self {
        CalendarEvent {
            summary: String::from(DEFAULT_SUMMARY),
            start: None,
            end: None,
            location: String::new(),
            description: String::new(),
        }
    }
}
