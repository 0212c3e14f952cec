//! Calendar-day handling for reports.
//!
//! Report dates arrive as `YYYY-MM-DD` strings and are interpreted in a
//! [`ReportZone`]: the host's local time zone by default, or a fixed UTC
//! offset when configured. A day covers `[00:00:00.000, 23:59:59.999]` in
//! that zone, which is 23 or 25 hours long across DST changes.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time zone used to decide which calendar day a photo belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReportZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl ReportZone {
    pub fn utc() -> Self {
        ReportZone::Fixed(Utc.fix())
    }

    /// The calendar date of `instant` in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            ReportZone::Local => instant.with_timezone(&Local).date_naive(),
            ReportZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

impl fmt::Display for ReportZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportZone::Local => write!(f, "local"),
            ReportZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl FromStr for ReportZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(ReportZone::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(ReportZone::utc());
        }
        parse_offset(s)
            .map(ReportZone::Fixed)
            .ok_or_else(|| format!("invalid report zone '{}': expected 'local', 'utc' or '+HH:MM'", s))
    }
}

impl TryFrom<String> for ReportZone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportZone> for String {
    fn from(zone: ReportZone) -> Self {
        zone.to_string()
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse a report date. Anything but a valid `YYYY-MM-DD` is `None`.
pub fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Inclusive UTC bounds of `date` in `zone`: local midnight through one
/// millisecond before the next local midnight.
pub fn day_bounds(date: NaiveDate, zone: ReportZone) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date.succ_opt()?;
    let (start, next_start) = match zone {
        ReportZone::Local => (start_of_day(&Local, date)?, start_of_day(&Local, next)?),
        ReportZone::Fixed(offset) => (start_of_day(&offset, date)?, start_of_day(&offset, next)?),
    };
    Some((start, next_start - Duration::milliseconds(1)))
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    // A DST jump can skip local midnight; the day then starts an hour later.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
