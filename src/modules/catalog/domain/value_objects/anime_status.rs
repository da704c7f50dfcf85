use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::AnimeStatus"]
#[serde(rename_all = "snake_case")]
pub enum AnimeStatus {
    Airing,
    Finished,
    NotYetAired,
    Unknown,
}

impl AnimeStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnimeStatus::Airing => "Currently Airing",
            AnimeStatus::Finished => "Finished Airing",
            AnimeStatus::NotYetAired => "Not yet aired",
            AnimeStatus::Unknown => "Unknown",
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            AnimeStatus::Airing => "airing",
            AnimeStatus::Finished => "finished",
            AnimeStatus::NotYetAired => "not_yet_aired",
            AnimeStatus::Unknown => "unknown",
        }
    }

    /// Value understood by the upstream `status` search parameter
    pub fn upstream_param(&self) -> Option<&'static str> {
        match self {
            AnimeStatus::Airing => Some("airing"),
            AnimeStatus::Finished => Some("complete"),
            AnimeStatus::NotYetAired => Some("upcoming"),
            AnimeStatus::Unknown => None,
        }
    }
}

impl Default for AnimeStatus {
    fn default() -> Self {
        AnimeStatus::Unknown
    }
}

impl fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl From<&str> for AnimeStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "currently airing" | "airing" => AnimeStatus::Airing,
            "finished airing" | "finished" | "complete" => AnimeStatus::Finished,
            "not yet aired" | "not_yet_aired" | "upcoming" => AnimeStatus::NotYetAired,
            _ => AnimeStatus::Unknown,
        }
    }
}

impl FromStr for AnimeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}
