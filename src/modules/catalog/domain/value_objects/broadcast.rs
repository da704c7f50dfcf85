//! Broadcast information with proper typing

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timezone every stored broadcast time is expressed in
pub const SOURCE_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

/// Broadcast weekday in the upstream's plural form ("Mondays"), or `Other`
/// when the upstream reports nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BroadcastDay {
    Mondays,
    Tuesdays,
    Wednesdays,
    Thursdays,
    Fridays,
    Saturdays,
    Sundays,
    Other,
}

impl BroadcastDay {
    pub const WEEK: [BroadcastDay; 7] = [
        BroadcastDay::Mondays,
        BroadcastDay::Tuesdays,
        BroadcastDay::Wednesdays,
        BroadcastDay::Thursdays,
        BroadcastDay::Fridays,
        BroadcastDay::Saturdays,
        BroadcastDay::Sundays,
    ];

    /// Normalize casing and pluralization to the canonical form.
    ///
    /// Accepts "monday", "Mondays", "MON", "mon." and so on. "other",
    /// "unknown" and the empty string map to `Other`. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_end_matches('.').to_lowercase();
        let singular = cleaned.strip_suffix('s').unwrap_or(&cleaned);

        let day = match singular {
            "monday" | "mon" => BroadcastDay::Mondays,
            "tuesday" | "tue" | "tues" => BroadcastDay::Tuesdays,
            "wednesday" | "wed" => BroadcastDay::Wednesdays,
            "thursday" | "thu" | "thur" | "thurs" => BroadcastDay::Thursdays,
            "friday" | "fri" => BroadcastDay::Fridays,
            "saturday" | "sat" => BroadcastDay::Saturdays,
            "sunday" | "sun" => BroadcastDay::Sundays,
            "other" | "unknown" | "" => BroadcastDay::Other,
            _ => return None,
        };
        Some(day)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastDay::Mondays => "Mondays",
            BroadcastDay::Tuesdays => "Tuesdays",
            BroadcastDay::Wednesdays => "Wednesdays",
            BroadcastDay::Thursdays => "Thursdays",
            BroadcastDay::Fridays => "Fridays",
            BroadcastDay::Saturdays => "Saturdays",
            BroadcastDay::Sundays => "Sundays",
            BroadcastDay::Other => "Other",
        }
    }

    pub fn weekday(&self) -> Option<Weekday> {
        match self {
            BroadcastDay::Mondays => Some(Weekday::Mon),
            BroadcastDay::Tuesdays => Some(Weekday::Tue),
            BroadcastDay::Wednesdays => Some(Weekday::Wed),
            BroadcastDay::Thursdays => Some(Weekday::Thu),
            BroadcastDay::Fridays => Some(Weekday::Fri),
            BroadcastDay::Saturdays => Some(Weekday::Sat),
            BroadcastDay::Sundays => Some(Weekday::Sun),
            BroadcastDay::Other => None,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::WEEK[weekday.num_days_from_monday() as usize]
    }

    pub fn previous(&self) -> Self {
        self.weekday()
            .map(|w| Self::from_weekday(w.pred()))
            .unwrap_or(BroadcastDay::Other)
    }

    pub fn next(&self) -> Self {
        self.weekday()
            .map(|w| Self::from_weekday(w.succ()))
            .unwrap_or(BroadcastDay::Other)
    }

    /// The day plus its calendar neighbours, wrapping across the week.
    /// `Other` has no neighbours.
    pub fn with_adjacent(&self) -> Vec<BroadcastDay> {
        match self {
            BroadcastDay::Other => vec![BroadcastDay::Other],
            day => vec![day.previous(), *day, day.next()],
        }
    }
}

impl fmt::Display for BroadcastDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broadcast slot as reported by the upstream.
///
/// `time` is always relative to `timezone`, which is pinned to
/// [`SOURCE_TIMEZONE`]. Values in any other zone are derived on demand and
/// never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastInfo {
    pub day: BroadcastDay,
    /// "HH:MM", 24h
    pub time: Option<String>,
    pub timezone: String,
    /// Human-readable string as delivered upstream
    pub string: Option<String>,
}

impl BroadcastInfo {
    /// Build from loosely typed parts; invalid times are dropped
    pub fn new(day: BroadcastDay, time: Option<&str>) -> Self {
        Self {
            day,
            time: time.and_then(normalize_time),
            timezone: SOURCE_TIMEZONE.name().to_string(),
            string: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(BroadcastDay::Other, None)
    }

    pub fn with_display_string(mut self, string: Option<String>) -> Self {
        self.string = string;
        self
    }

    pub fn get_time(&self) -> Option<NaiveTime> {
        self.time
            .as_ref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
    }
}

impl Default for BroadcastInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Broadcast slot converted into a caller's timezone (derived, never persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBroadcast {
    pub day: BroadcastDay,
    pub time: Option<String>,
    pub timezone: String,
}

/// Accepts "H:MM" or "HH:MM" and returns the zero-padded form
fn normalize_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}
