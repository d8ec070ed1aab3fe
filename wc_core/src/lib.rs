//! This crate implements the calendar core of the wall calendar.
//!
//! Events are read from a remote iCalendar feed configured through `ICS_URL`,
//! kept in a short-lived in-process cache and filtered by month.

pub mod config;
pub mod error;
pub mod event;
pub mod feed_cache;
pub mod feed_client;
pub mod month_filter;
