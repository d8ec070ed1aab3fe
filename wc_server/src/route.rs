pub mod events;
pub mod index;

use std::{path::Path, sync::Arc};

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use wc_core::feed_cache::FeedCache;

use crate::theme::Theme;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<FeedCache>,
    /// Replaces the seasonal theme when set.
    pub theme: Option<Theme>,
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index::handler))
        .route("/events/:year/:month", get(events::handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use wc_core::{error::FeedError, feed_cache::FeedCache, feed_client::FeedSource};

    use crate::{route::AppState, theme::Theme};

    pub static ICS: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nSUMMARY:Standup\r\nDTSTART:20240210T090000Z\r\nDTEND:20240210T100000Z\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nSUMMARY:Retro\r\nDTSTART;VALUE=DATE:20240301\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    pub struct StaticSource {
        pub fetches: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<String, FeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(String::from(ICS))
        }
    }

    pub fn state(url: Option<&'static str>, theme: Option<Theme>) -> (Arc<StaticSource>, AppState) {
        let source = Arc::new(StaticSource {
            fetches: AtomicUsize::new(0),
        });
        let cache = FeedCache::new(source.clone(), move || url.map(String::from));
        let state = AppState {
            cache: Arc::new(cache),
            theme,
        };
        (source, state)
    }
}
