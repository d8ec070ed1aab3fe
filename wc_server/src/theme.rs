//! The seasonal theme of the page.

use std::{fmt, str::FromStr};

use anyhow::bail;
use chrono::{Datelike, Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Default,
    Winter,
    Christmas,
    Valentines,
    StPatrick,
    Easter,
    Spring,
    Summer,
    CanadaDay,
    Autumn,
    Halloween,
}

static THEMES: [Theme; 11] = [
    Theme::Default,
    Theme::Winter,
    Theme::Christmas,
    Theme::Valentines,
    Theme::StPatrick,
    Theme::Easter,
    Theme::Spring,
    Theme::Summer,
    Theme::CanadaDay,
    Theme::Autumn,
    Theme::Halloween,
];

impl Theme {
    /// Get the theme for a day.
    ///
    /// Holidays take precedence over seasons.
    pub fn for_date(date: NaiveDate) -> Theme {
        let month_day = (date.month(), date.day());
        if is_easter_weekend(date) {
            return Theme::Easter;
        }
        match month_day {
            (2, 7..=14) => Theme::Valentines,
            (3, 14..=17) => Theme::StPatrick,
            (7, 1) => Theme::CanadaDay,
            (10, 24..=31) => Theme::Halloween,
            (12, 1..=26) => Theme::Christmas,
            (3, 20..) | (4..=5, _) | (6, ..=20) => Theme::Spring,
            (6, 21..) | (7..=8, _) | (9, ..=21) => Theme::Summer,
            (9, 22..) | (10..=11, _) => Theme::Autumn,
            _ => Theme::Winter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Winter => "winter",
            Theme::Christmas => "christmas",
            Theme::Valentines => "valentines",
            Theme::StPatrick => "stpatrick",
            Theme::Easter => "easter",
            Theme::Spring => "spring",
            Theme::Summer => "summer",
            Theme::CanadaDay => "canadaday",
            Theme::Autumn => "autumn",
            Theme::Halloween => "halloween",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match THEMES.iter().find(|theme| theme.as_str() == name) {
            Some(theme) => Ok(*theme),
            None => bail!("unknown theme {s:?}"),
        }
    }
}

/// Whether `date` lies between Good Friday and Easter Monday.
fn is_easter_weekend(date: NaiveDate) -> bool {
    easter_sunday(date.year()).is_some_and(|easter| {
        easter - Duration::days(2) <= date && date <= easter + Duration::days(1)
    })
}

/// Get Easter Sunday of the Gregorian calendar (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let n = h + l - 7 * m + 114;
    NaiveDate::from_ymd_opt(year, u32::try_from(n / 31).ok()?, u32::try_from(n % 31 + 1).ok()?)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use crate::theme::{easter_sunday, Theme};

    fn theme_on(date: &str) -> Theme {
        Theme::for_date(NaiveDate::from_str(date).unwrap())
    }

    #[test]
    fn test_easter_sunday() {
        assert_eq!(easter_sunday(2024), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(easter_sunday(2025), NaiveDate::from_ymd_opt(2025, 4, 20));
        assert_eq!(easter_sunday(2026), NaiveDate::from_ymd_opt(2026, 4, 5));
    }

    #[test]
    fn test_holidays() {
        assert_eq!(theme_on("2024-02-14"), Theme::Valentines);
        assert_eq!(theme_on("2024-03-17"), Theme::StPatrick);
        assert_eq!(theme_on("2024-03-29"), Theme::Easter);
        assert_eq!(theme_on("2024-04-01"), Theme::Easter);
        assert_eq!(theme_on("2025-04-18"), Theme::Easter);
        assert_eq!(theme_on("2024-07-01"), Theme::CanadaDay);
        assert_eq!(theme_on("2024-10-31"), Theme::Halloween);
        assert_eq!(theme_on("2024-12-25"), Theme::Christmas);
    }

    #[test]
    fn test_seasons() {
        assert_eq!(theme_on("2024-01-15"), Theme::Winter);
        assert_eq!(theme_on("2024-02-15"), Theme::Winter);
        assert_eq!(theme_on("2024-03-19"), Theme::Winter);
        assert_eq!(theme_on("2024-03-20"), Theme::Spring);
        assert_eq!(theme_on("2024-04-02"), Theme::Spring);
        assert_eq!(theme_on("2024-06-20"), Theme::Spring);
        assert_eq!(theme_on("2024-06-21"), Theme::Summer);
        assert_eq!(theme_on("2024-07-02"), Theme::Summer);
        assert_eq!(theme_on("2024-09-21"), Theme::Summer);
        assert_eq!(theme_on("2024-09-22"), Theme::Autumn);
        assert_eq!(theme_on("2024-10-23"), Theme::Autumn);
        assert_eq!(theme_on("2024-11-30"), Theme::Autumn);
        assert_eq!(theme_on("2024-12-27"), Theme::Winter);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Theme::from_str("stpatrick").unwrap(), Theme::StPatrick);
        assert_eq!(Theme::from_str(" Default ").unwrap(), Theme::Default);
        assert!(Theme::from_str("disco").is_err());
    }
}
