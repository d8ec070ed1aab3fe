//! This client fetches the iCalendar feed and parses it into calendar events.

use std::{
    borrow::Cow,
    collections::HashMap,
    io::{BufReader, Cursor},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use ical::{
    parser::ical::component::{IcalEvent, IcalTimeZone},
    property::Property,
    IcalParser,
};
use tracing::{debug, warn};

use crate::{
    error::FeedError,
    event::{CalendarEvent, DEFAULT_SUMMARY},
};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

static DATE_FORMAT: &str = "%Y%m%d";
static DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Something the raw feed text can be fetched from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

/// Fetches feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Build a source whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpFeedSource { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> FeedError {
        if err.is_timeout() {
            FeedError::Timeout(self.timeout)
        } else {
            FeedError::from(err)
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    /// Get the feed text, treating any non-success status as an error.
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| self.classify(err))?;
        response.text().await.map_err(|err| self.classify(err))
    }
}

/// Get all events of the feed at `url`.
pub async fn get(source: &dyn FeedSource, url: &str) -> Result<Vec<CalendarEvent>, FeedError> {
    let ics = source.fetch(url).await?;
    parse(&ics)
}

/// A start or end value of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventTime {
    Date(NaiveDate),
    Floating(NaiveDateTime),
    Utc(DateTime<Utc>),
}

impl EventTime {
    fn to_iso(self) -> String {
        match self {
            EventTime::Date(date) => date.format("%Y-%m-%d").to_string(),
            EventTime::Floating(date_time) => date_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            EventTime::Utc(date_time) => date_time.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

trait GetIcalProperty {
    fn get_ical_property(&self, name: &str) -> Option<&Property>;

    fn get_ical_property_value(&self, name: &str) -> Option<&String> {
        self.get_ical_property(name)
            .and_then(|property| property.value.as_ref())
    }
}

impl GetIcalProperty for IcalEvent {
    fn get_ical_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }
}

impl GetIcalProperty for IcalTimeZone {
    fn get_ical_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }
}

/// Get the first value of a property parameter, without surrounding quotes.
fn param_value<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(param_name, _)| param_name.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|value| value.trim_matches('"'))
}

/// Components the parser understands, everything else is skipped.
static KNOWN_COMPONENTS: [&str; 9] = [
    "VCALENDAR",
    "VEVENT",
    "VTODO",
    "VJOURNAL",
    "VFREEBUSY",
    "VTIMEZONE",
    "STANDARD",
    "DAYLIGHT",
    "VALARM",
];

/// Windows time zone names as written by Outlook and Exchange, with the IANA
/// zone of their primary territory.
static WINDOWS_ZONES: [(&str, &str); 42] = [
    ("Hawaiian Standard Time", "Pacific/Honolulu"),
    ("Alaskan Standard Time", "America/Anchorage"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("US Mountain Standard Time", "America/Phoenix"),
    ("Mountain Standard Time", "America/Denver"),
    ("Central Standard Time", "America/Chicago"),
    ("Canada Central Standard Time", "America/Regina"),
    ("Central America Standard Time", "America/Guatemala"),
    ("Eastern Standard Time", "America/New_York"),
    ("US Eastern Standard Time", "America/Indiana/Indianapolis"),
    ("Atlantic Standard Time", "America/Halifax"),
    ("Newfoundland Standard Time", "America/St_Johns"),
    ("SA Pacific Standard Time", "America/Bogota"),
    ("E. South America Standard Time", "America/Sao_Paulo"),
    ("Argentina Standard Time", "America/Argentina/Buenos_Aires"),
    ("UTC", "UTC"),
    ("GMT Standard Time", "Europe/London"),
    ("Greenwich Standard Time", "Atlantic/Reykjavik"),
    ("W. Europe Standard Time", "Europe/Berlin"),
    ("Central Europe Standard Time", "Europe/Budapest"),
    ("Romance Standard Time", "Europe/Paris"),
    ("Central European Standard Time", "Europe/Warsaw"),
    ("E. Europe Standard Time", "Europe/Chisinau"),
    ("GTB Standard Time", "Europe/Bucharest"),
    ("FLE Standard Time", "Europe/Kiev"),
    ("Turkey Standard Time", "Europe/Istanbul"),
    ("Russian Standard Time", "Europe/Moscow"),
    ("Israel Standard Time", "Asia/Jerusalem"),
    ("Egypt Standard Time", "Africa/Cairo"),
    ("South Africa Standard Time", "Africa/Johannesburg"),
    ("Arabian Standard Time", "Asia/Dubai"),
    ("India Standard Time", "Asia/Kolkata"),
    ("China Standard Time", "Asia/Shanghai"),
    ("Singapore Standard Time", "Asia/Singapore"),
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("Korea Standard Time", "Asia/Seoul"),
    ("W. Australia Standard Time", "Australia/Perth"),
    ("Cen. Australia Standard Time", "Australia/Adelaide"),
    ("E. Australia Standard Time", "Australia/Brisbane"),
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("Tasmania Standard Time", "Australia/Hobart"),
    ("New Zealand Standard Time", "Pacific/Auckland"),
];

/// Parse the iCalendar text into events, in document order.
pub fn parse(ics: &str) -> Result<Vec<CalendarEvent>, FeedError> {
    let ics = skip_unknown_components(ics);
    let parser = IcalParser::new(BufReader::new(Cursor::new(ics.as_bytes())));
    let mut calendar_count = 0;
    let mut events = vec![];
    for ical_calendar_result in parser {
        let ical_calendar =
            ical_calendar_result.map_err(|err| FeedError::Parse(err.to_string()))?;
        calendar_count += 1;
        let time_zones = TimeZones::from_vtimezones(&ical_calendar.timezones);
        events.extend(
            ical_calendar
                .events
                .iter()
                .map(|ical_event| to_calendar_event(ical_event, &time_zones)),
        );
    }
    if calendar_count == 0 {
        return Err(FeedError::Parse(String::from("no VCALENDAR component found")));
    }
    Ok(events)
}

/// Remove components the parser would reject, such as `VAVAILABILITY` or
/// `X-` extensions, together with everything nested in them.
fn skip_unknown_components(ics: &str) -> Cow<'_, str> {
    let is_unknown = |name: &str| {
        !KNOWN_COMPONENTS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name))
    };
    if !ics
        .lines()
        .any(|line| component_name(line, "BEGIN:").is_some_and(is_unknown))
    {
        return Cow::Borrowed(ics);
    }
    let mut kept = String::with_capacity(ics.len());
    let mut skipping: Option<(String, usize)> = None;
    for line in ics.lines() {
        if let Some((name, depth)) = &mut skipping {
            if component_name(line, "BEGIN:").is_some_and(|begun| begun.eq_ignore_ascii_case(name)) {
                *depth += 1;
            } else if component_name(line, "END:").is_some_and(|ended| ended.eq_ignore_ascii_case(name)) {
                *depth -= 1;
            }
            if *depth == 0 {
                skipping = None;
            }
            continue;
        }
        if let Some(name) = component_name(line, "BEGIN:").filter(|name| is_unknown(*name)) {
            warn!(component = name, "skipping unsupported calendar component");
            skipping = Some((String::from(name), 1));
            continue;
        }
        kept.push_str(line.trim_end_matches('\r'));
        kept.push_str("\r\n");
    }
    Cow::Owned(kept)
}

/// Get the component name of a `BEGIN:`/`END:` line.
fn component_name<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let line = line.trim_end_matches('\r');
    let head = line.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| line[keyword.len()..].trim())
}

/// Resolves the `TZID` parameters of one calendar.
struct TimeZones {
    /// Custom `TZID`s of the calendar's `VTIMEZONE`s that name their IANA zone.
    aliases: HashMap<String, Tz>,
}

impl TimeZones {
    fn from_vtimezones(ical_timezones: &[IcalTimeZone]) -> Self {
        let aliases = ical_timezones
            .iter()
            .filter_map(|ical_timezone| {
                let tzid = ical_timezone.get_ical_property_value("TZID")?;
                let location = ical_timezone.get_ical_property_value("X-LIC-LOCATION")?;
                let tz = location.trim().parse::<Tz>().ok()?;
                Some((String::from(tzid.trim()), tz))
            })
            .collect();
        TimeZones { aliases }
    }

    /// Look `tzid` up as an IANA name, then among the calendar's own zones,
    /// then as a Windows zone name.
    fn resolve(&self, tzid: &str) -> Option<Tz> {
        if let Ok(tz) = tzid.parse::<Tz>() {
            return Some(tz);
        }
        if let Some(tz) = self.aliases.get(tzid) {
            return Some(*tz);
        }
        let (_, iana) = WINDOWS_ZONES
            .iter()
            .find(|(windows, _)| windows.eq_ignore_ascii_case(tzid))?;
        debug!(tzid, iana, "mapped Windows time zone");
        iana.parse::<Tz>().ok()
    }
}

fn to_calendar_event(ical_event: &IcalEvent, time_zones: &TimeZones) -> CalendarEvent {
    let text = |name: &str| {
        ical_event
            .get_ical_property_value(name)
            .map(|value| unescape_text(value))
    };
    let time = |name: &str| {
        let property = ical_event.get_ical_property(name)?;
        match parse_event_time(property, time_zones) {
            Ok(event_time) => Some(event_time.to_iso()),
            Err(err) => {
                warn!(property = name, value = ?property.value, "dropping event time: {err}");
                None
            }
        }
    };
    CalendarEvent {
        summary: text("SUMMARY").unwrap_or_else(|| String::from(DEFAULT_SUMMARY)),
        start: time("DTSTART"),
        end: time("DTEND"),
        location: text("LOCATION").unwrap_or_default(),
        description: text("DESCRIPTION").unwrap_or_default(),
    }
}

/// Parse a `DTSTART`/`DTEND` property.
///
/// Zoned values are normalized to UTC, floating values are kept as they are.
/// A local time skipped by a daylight saving transition is read one hour
/// later, so 02:30 on a spring-forward night becomes 03:30.
fn parse_event_time(property: &Property, time_zones: &TimeZones) -> Result<EventTime, String> {
    let value = property
        .value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or("empty value")?;
    let is_date = param_value(property, "VALUE").is_some_and(|kind| kind.eq_ignore_ascii_case("DATE"))
        || !value.contains('T');
    if is_date {
        return NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(EventTime::Date)
            .map_err(|err| err.to_string());
    }
    if let Some(value) = value.strip_suffix('Z') {
        let date_time =
            NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|err| err.to_string())?;
        return Ok(EventTime::Utc(Utc.from_utc_datetime(&date_time)));
    }
    let date_time =
        NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|err| err.to_string())?;
    let Some(tzid) = param_value(property, "TZID") else {
        return Ok(EventTime::Floating(date_time));
    };
    let Some(tz) = time_zones.resolve(tzid) else {
        warn!(tzid, "unknown time zone, keeping local time");
        return Ok(EventTime::Floating(date_time));
    };
    tz.from_local_datetime(&date_time)
        .earliest()
        .or_else(|| {
            let shifted = date_time + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted).earliest()
        })
        .map(|zoned| EventTime::Utc(zoned.with_timezone(&Utc)))
        .ok_or_else(|| format!("{date_time} does not exist in {tzid}"))
}

/// Undo the TEXT escaping of RFC 5545.
fn unescape_text(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => unescaped.push('\n'),
            Some(escaped) => unescaped.push(escaped),
            None => unescaped.push('\\'),
        }
    }
    unescaped
}
