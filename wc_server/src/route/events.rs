use axum::{
    extract::{Path, State},
    http::HeaderName,
    Json,
};
use wc_core::{event::CalendarEvent, month_filter};

use crate::route::AppState;

/// Tells clients whether an empty answer means a degraded feed.
pub static FEED_STATUS_HEADER: &str = "x-feed-status";

/// Handle month requests.
///
/// Always answers with a list; failures of the feed only show in the
/// `x-feed-status` header.
pub async fn handler(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ([(HeaderName, &'static str); 1], Json<Vec<CalendarEvent>>) {
    let month_events = month_filter::month_events(&state.cache, year, month).await;
    (
        [(
            HeaderName::from_static(FEED_STATUS_HEADER),
            month_events.status.as_str(),
        )],
        Json(month_events.events),
    )
}
