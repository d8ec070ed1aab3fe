//! Selects the events starting in a given month.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};
use tracing::{debug, error, warn};

use crate::{
    event::CalendarEvent,
    feed_cache::{FeedCache, FeedStatus},
};

/// The events of a month together with the status of the feed lookup.
#[derive(Debug, Clone)]
pub struct MonthEvents {
    pub events: Vec<CalendarEvent>,
    pub status: FeedStatus,
}

/// The inclusive date range of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthRange {
    /// Get the range of `month` (1 to 12) in `year`, if such a month exists.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(MonthRange { first, last })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

/// Get the events of the configured feed starting in `month` of `year`.
pub async fn events_for_month(cache: &FeedCache, year: i32, month: u32) -> Vec<CalendarEvent> {
    month_events(cache, year, month).await.events
}

/// Get the events starting in `month` of `year` along with the feed status.
///
/// An invalid month yields no events.
pub async fn month_events(cache: &FeedCache, year: i32, month: u32) -> MonthEvents {
    let feed_events = cache.events().await;
    let Some(range) = MonthRange::new(year, month) else {
        error!("invalid year/month combination: {year}-{month}");
        return MonthEvents {
            events: vec![],
            status: feed_events.status,
        };
    };
    debug!("filtering events between {} and {}", range.first, range.last);
    let events = filter(&feed_events.events, range);
    debug!("found {} events for {year}-{month}", events.len());
    MonthEvents {
        events,
        status: feed_events.status,
    }
}

/// Keep the events whose start date lies in `range`, preserving their order.
///
/// Only the start date counts, so events beginning before the range are
/// left out even when they overlap it.
pub fn filter(events: &[CalendarEvent], range: MonthRange) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|event| {
            let Some(start) = event.start.as_deref() else {
                return false;
            };
            match start_date(start) {
                Some(date) => range.contains(date),
                None => {
                    warn!(start, summary = %event.summary, "could not parse event start date");
                    false
                }
            }
        })
        .cloned()
        .collect()
}

/// Parse the date part of an ISO-8601 start value.
///
/// Timestamps keep the date of their own offset.
fn start_date(start: &str) -> Option<NaiveDate> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(start) {
        return Some(date_time.date_naive());
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date_time.date());
    }
    NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, sync::Arc};

    use chrono::NaiveDate;

    use crate::{
        event::CalendarEvent,
        feed_cache::{
            tests::{ics, FakeSource, URL},
            FeedCache, FeedStatus,
        },
        month_filter::{events_for_month, filter, month_events, start_date, MonthRange},
    };

    fn event(summary: &str, start: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            summary: String::from(summary),
            start: start.map(String::from),
            ..CalendarEvent::default()
        }
    }

    fn summaries(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|event| event.summary.as_str()).collect()
    }

    fn cache_for(ics: String) -> (Arc<FakeSource>, FeedCache) {
        let source = Arc::new(FakeSource::new(ics));
        let cache = FeedCache::new(source.clone(), || Some(String::from(URL)));
        (source, cache)
    }

    #[test]
    fn test_month_range() {
        let range = MonthRange::new(2024, 2).unwrap();
        assert_eq!(range.first, NaiveDate::from_str("2024-02-01").unwrap());
        assert_eq!(range.last, NaiveDate::from_str("2024-02-29").unwrap());
        let range = MonthRange::new(2023, 12).unwrap();
        assert_eq!(range.first, NaiveDate::from_str("2023-12-01").unwrap());
        assert_eq!(range.last, NaiveDate::from_str("2023-12-31").unwrap());
        assert_eq!(MonthRange::new(2024, 0), None);
        assert_eq!(MonthRange::new(2024, 13), None);
    }

    #[test]
    fn test_start_date() {
        let expected = NaiveDate::from_str("2024-02-10").unwrap();
        assert_eq!(start_date("2024-02-10T09:00:00+00:00"), Some(expected));
        assert_eq!(start_date("2024-02-10T09:00:00Z"), Some(expected));
        assert_eq!(start_date("2024-02-10T23:30:00-05:00"), Some(expected));
        assert_eq!(start_date("2024-02-10T09:00:00"), Some(expected));
        assert_eq!(start_date("2024-02-10"), Some(expected));
        assert_eq!(start_date("10/02/2024"), None);
    }

    #[test]
    fn test_filter() {
        let events = vec![
            event("before", Some("2024-01-31T23:59:59+00:00")),
            event("first day", Some("2024-02-01")),
            event("no start", None),
            event("floating", Some("2024-02-14T19:00:00")),
            event("garbage", Some("soon")),
            event("last day", Some("2024-02-29T23:00:00+00:00")),
            event("after", Some("2024-03-01")),
        ];
        let filtered = filter(&events, MonthRange::new(2024, 2).unwrap());
        assert_eq!(summaries(&filtered), vec!["first day", "floating", "last day"]);
    }

    #[tokio::test]
    async fn test_events_for_month() {
        let (_, cache) = cache_for(ics(&[
            ("Standup", "20240210T090000Z", "20240210T100000Z"),
            ("Retro", "20240305T090000Z", "20240305T100000Z"),
        ]));
        let events = events_for_month(&cache, 2024, 2).await;
        assert_eq!(
            events,
            vec![CalendarEvent {
                summary: String::from("Standup"),
                start: Some(String::from("2024-02-10T09:00:00+00:00")),
                end: Some(String::from("2024-02-10T10:00:00+00:00")),
                location: String::new(),
                description: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_events_for_month_excludes_overlap_from_previous_month() {
        let (_, cache) = cache_for(ics(&[("Ski trip", "20240131", "20240202")]));
        let events = events_for_month(&cache, 2024, 2).await;
        assert!(events.is_empty());
        let events = events_for_month(&cache, 2024, 1).await;
        assert_eq!(summaries(&events), vec!["Ski trip"]);
    }

    #[tokio::test]
    async fn test_events_for_invalid_month() {
        let (_, cache) = cache_for(ics(&[("Standup", "20240210T090000Z", "20240210T100000Z")]));
        assert!(events_for_month(&cache, 2024, 0).await.is_empty());
        let month = month_events(&cache, 2024, 13).await;
        assert!(month.events.is_empty());
        assert!(!month.status.is_degraded());
    }

    #[tokio::test]
    async fn test_month_events_status() {
        let (source, cache) = cache_for(ics(&[("Standup", "20240210T090000Z", "20240210T100000Z")]));
        assert_eq!(month_events(&cache, 2024, 2).await.status, FeedStatus::Fetched);
        assert_eq!(month_events(&cache, 2024, 3).await.status, FeedStatus::Cached);
        assert_eq!(source.fetch_count(), 1);
    }
}
