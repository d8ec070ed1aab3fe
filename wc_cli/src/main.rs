use std::{io::stdout, sync::Arc};

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wc_core::{
    config,
    feed_cache::FeedCache,
    feed_client::HttpFeedSource,
    month_filter::{self, MonthRange},
};

#[derive(Debug, Parser)]
pub struct Arguments {
    /// the year
    pub year: i32,
    /// the month, 1 to 12
    pub month: u32,
    /// the iCalendar feed, defaults to ICS_URL
    #[arg(long)]
    pub url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "wc_core=warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Arguments::parse();
    if MonthRange::new(args.year, args.month).is_none() {
        bail!("{}-{} is not a valid month", args.year, args.month);
    }
    let url = args.url.or_else(config::feed_url);
    let cache = FeedCache::new(Arc::new(HttpFeedSource::new()?), move || url.clone());
    let month_events = month_filter::month_events(&cache, args.year, args.month).await;
    if month_events.status.is_degraded() {
        bail!("could not load the feed ({})", month_events.status.as_str());
    }
    serde_json::to_writer_pretty(stdout(), &month_events.events)?;
    println!();
    Ok(())
}
