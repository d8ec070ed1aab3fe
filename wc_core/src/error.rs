//! Errors raised while fetching or parsing the calendar feed.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::feed_client::FETCH_TIMEOUT;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request to the feed timed out after {0:?}")]
    Timeout(Duration),

    #[error("feed responded with status {0}")]
    Status(StatusCode),

    #[error("failed to fetch the feed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to parse the feed: {0}")]
    Parse(String),
}

impl FeedError {
    /// Whether the error happened before any payload was received.
    pub fn is_fetch_error(&self) -> bool {
        !matches!(self, FeedError::Parse(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(FETCH_TIMEOUT)
        } else if let Some(status) = err.status() {
            FeedError::Status(status)
        } else {
            FeedError::Request(err)
        }
    }
}
