use askama::Template;
use axum::{extract::State, http::StatusCode, response::Html};
use chrono::Local;

use crate::{route::AppState, theme::Theme};

#[derive(Debug, Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    theme: &'static str,
}

/// Render the month view with today's theme.
pub async fn handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, String)> {
    let theme = state
        .theme
        .unwrap_or_else(|| Theme::for_date(Local::now().date_naive()));
    render(theme)
}

fn render(theme: Theme) -> Result<Html<String>, (StatusCode, String)> {
    let page = IndexTemplate {
        theme: theme.as_str(),
    }
    .render()
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Html(page))
}
