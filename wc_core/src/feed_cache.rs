//! A short-lived cache of the parsed calendar feed.
//!
//! The feed is fetched at most once per freshness window and URL. Failed
//! fetches leave the cache untouched and yield no events. Lookups that queued
//! up behind a failing fetch share its failure instead of retrying in turn.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{debug, error, info};

use crate::{
    config,
    error::FeedError,
    event::CalendarEvent,
    feed_client::{self, FeedSource, HttpFeedSource},
};

/// Minutes during which a fetched feed is served without fetching it again.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 15;

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Cached,
    Fetched,
    Unconfigured,
    FetchFailed,
    ParseFailed,
}

impl FeedStatus {
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            FeedStatus::Unconfigured | FeedStatus::FetchFailed | FeedStatus::ParseFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedStatus::Cached => "cached",
            FeedStatus::Fetched => "fetched",
            FeedStatus::Unconfigured => "unconfigured",
            FeedStatus::FetchFailed => "fetch-failed",
            FeedStatus::ParseFailed => "parse-failed",
        }
    }
}

impl From<&FeedError> for FeedStatus {
    fn from(value: &FeedError) -> Self {
        if value.is_fetch_error() {
            FeedStatus::FetchFailed
        } else {
            FeedStatus::ParseFailed
        }
    }
}

/// The events of a lookup together with how they were obtained.
#[derive(Debug, Clone)]
pub struct FeedEvents {
    pub events: Arc<Vec<CalendarEvent>>,
    pub status: FeedStatus,
}

impl FeedEvents {
    fn empty(status: FeedStatus) -> Self {
        FeedEvents {
            events: Arc::new(vec![]),
            status,
        }
    }
}

/// The result of the last successful fetch.
#[derive(Debug)]
struct FeedCacheEntry {
    events: Arc<Vec<CalendarEvent>>,
    fetched_at: DateTime<Utc>,
    source_url: String,
}

impl FeedCacheEntry {
    fn is_fresh(&self, url: &str, now: DateTime<Utc>) -> bool {
        self.source_url == url
            && now.signed_duration_since(self.fetched_at)
                < Duration::minutes(FRESHNESS_WINDOW_MINUTES)
    }
}

/// The last fetch attempt, kept while it is a failure.
#[derive(Debug)]
struct FailedAttempt {
    source_url: String,
    finished_at: Instant,
    status: FeedStatus,
}

type FeedUrlProvider = Box<dyn Fn() -> Option<String> + Send + Sync>;

pub struct FeedCache {
    source: Arc<dyn FeedSource>,
    feed_url: FeedUrlProvider,
    entry: RwLock<Option<Arc<FeedCacheEntry>>>,
    refresh: Mutex<Option<FailedAttempt>>,
}

impl FeedCache {
    /// Create an empty cache fetching from `source`.
    ///
    /// `feed_url` is asked for the URL on every lookup, so reconfiguring it
    /// invalidates the cache.
    pub fn new<F>(source: Arc<dyn FeedSource>, feed_url: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        FeedCache {
            source,
            feed_url: Box::new(feed_url),
            entry: RwLock::new(None),
            refresh: Mutex::new(None),
        }
    }

    /// Create a cache fetching over HTTP from the URL in `ICS_URL`.
    pub fn from_env() -> Result<Self, FeedError> {
        Ok(FeedCache::new(
            Arc::new(HttpFeedSource::new()?),
            config::feed_url,
        ))
    }

    /// Get all events of the configured feed.
    pub async fn events(&self) -> FeedEvents {
        self.events_at(Utc::now()).await
    }

    /// Get all events of the configured feed as seen at `now`.
    pub async fn events_at(&self, now: DateTime<Utc>) -> FeedEvents {
        let Some(url) = (self.feed_url)() else {
            error!("{} is not configured", config::FEED_URL_VAR);
            return FeedEvents::empty(FeedStatus::Unconfigured);
        };
        let waiting_since = Instant::now();
        if let Some(events) = self.fresh_events(&url, now).await {
            debug!("using cached feed data");
            return FeedEvents {
                events,
                status: FeedStatus::Cached,
            };
        }
        let mut last_failure = self.refresh.lock().await;
        // Another lookup may have refreshed while this one waited.
        if let Some(events) = self.fresh_events(&url, now).await {
            debug!("using feed data fetched by a concurrent lookup");
            return FeedEvents {
                events,
                status: FeedStatus::Cached,
            };
        }
        if let Some(failed) = last_failure
            .as_ref()
            .filter(|failed| failed.source_url == url && failed.finished_at > waiting_since)
        {
            debug!("a concurrent lookup failed to load the feed, not retrying");
            return FeedEvents::empty(failed.status);
        }
        info!(url = %url, "fetching fresh feed data");
        match feed_client::get(self.source.as_ref(), &url).await {
            Ok(events) => {
                info!("fetched and parsed {} events", events.len());
                *last_failure = None;
                let events = Arc::new(events);
                *self.entry.write().await = Some(Arc::new(FeedCacheEntry {
                    events: Arc::clone(&events),
                    fetched_at: now,
                    source_url: url,
                }));
                FeedEvents {
                    events,
                    status: FeedStatus::Fetched,
                }
            }
            Err(err) => {
                error!(url = %url, "error loading the feed: {err}");
                let status = FeedStatus::from(&err);
                *last_failure = Some(FailedAttempt {
                    source_url: url,
                    finished_at: Instant::now(),
                    status,
                });
                FeedEvents::empty(status)
            }
        }
    }

    async fn fresh_events(&self, url: &str, now: DateTime<Utc>) -> Option<Arc<Vec<CalendarEvent>>> {
        let entry = self.entry.read().await.clone()?;
        entry
            .is_fresh(url, now)
            .then(|| Arc::clone(&entry.events))
    }
}
