//! Broadcast schedule listing with timezone day-shift
//!
//! Stored broadcasts are in [`SOURCE_TIMEZONE`]. A listing in another zone
//! widens the day filter to the neighbouring days, converts every candidate
//! and re-filters, re-sorts and re-paginates in memory. The `total` of such a
//! listing is estimated unless the whole candidate set was inspected, and
//! [`PageInfo::total_is_approximate`] says which.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use super::search::normalize_genres;
use crate::modules::catalog::domain::{
    entities::{Anime, Entity},
    repositories::{
        cmp_missing_last, compare_entities, CatalogFilter, CatalogQuery, CatalogStore, SortKey,
        SortSpec,
    },
    value_objects::{AnimeStatus, BroadcastDay, BroadcastInfo, EntityKind, LocalBroadcast, SOURCE_TIMEZONE},
};
use crate::shared::application::{PageInfo, PaginationParams};
use crate::shared::config::{CatalogConfig, ScheduleTotalMode};
use crate::shared::errors::AppResult;
use crate::shared::utils::logger::TimedOperation;

/// Candidate window multiplier for converted listings
const OVERFETCH_FACTOR: u64 = 3;

#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    pub total_mode: ScheduleTotalMode,
}

impl From<&CatalogConfig> for ScheduleConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            total_mode: config.schedule_total_mode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleQuery {
    /// Raw day as sent by the caller ("monday", "Mondays", "MON")
    pub day: Option<String>,
    pub status: Option<AnimeStatus>,
    pub genres: Vec<String>,
    /// IANA zone name; the source zone when absent
    pub timezone: Option<String>,
    pub sort: SortSpec,
    pub pagination: PaginationParams,
    /// Date whose week the conversion uses (DST); today when absent
    pub as_of: Option<NaiveDate>,
}

impl Default for ScheduleQuery {
    fn default() -> Self {
        Self {
            day: None,
            status: None,
            genres: Vec::new(),
            timezone: None,
            sort: SortSpec::broadcast_time(),
            pagination: PaginationParams::default(),
            as_of: None,
        }
    }
}

impl ScheduleQuery {
    pub fn for_day(day: impl Into<String>) -> Self {
        Self {
            day: Some(day.into()),
            ..Self::default()
        }
    }

    pub fn in_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.pagination = PaginationParams::new(page, limit);
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Canonical day filter; blank and unrecognized values drop the filter
    pub fn requested_day(&self) -> Option<BroadcastDay> {
        let raw = self.day.as_deref().map(str::trim).filter(|d| !d.is_empty())?;
        let day = BroadcastDay::parse(raw);
        if day.is_none() {
            log::warn!("Unrecognized schedule day '{}', listing all days", raw);
        }
        day
    }

    /// Target zone; unknown names fall back to the source zone
    pub fn target_timezone(&self) -> Tz {
        let Some(raw) = self.timezone.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return SOURCE_TIMEZONE;
        };
        match raw.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!(
                    "Unknown timezone '{}', using {}",
                    raw,
                    SOURCE_TIMEZONE.name()
                );
                SOURCE_TIMEZONE
            }
        }
    }

    fn filter(&self, days: Vec<BroadcastDay>) -> CatalogFilter {
        CatalogFilter {
            text: None,
            status: self.status,
            genres: normalize_genres(&self.genres),
            broadcast_days: days,
            min_score: None,
        }
    }
}

/// Stored anime plus its broadcast in the caller's zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub anime: Anime,
    pub local_broadcast: LocalBroadcast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub items: Vec<ScheduleItem>,
    pub pagination: PageInfo,
    pub timezone: String,
}

pub struct ScheduleEngine {
    store: Arc<dyn CatalogStore>,
    config: ScheduleConfig,
}

impl ScheduleEngine {
    pub fn new(store: Arc<dyn CatalogStore>, config: ScheduleConfig) -> Self {
        Self { store, config }
    }

    pub async fn query_schedule(&self, query: &ScheduleQuery) -> AppResult<ScheduleResult> {
        let timer = TimedOperation::new("query_schedule");
        let query = &ScheduleQuery {
            pagination: query.pagination.clamped(),
            ..query.clone()
        };
        let tz = query.target_timezone();
        let day = query.requested_day();

        let result = if tz == SOURCE_TIMEZONE {
            self.query_source_zone(query, day).await?
        } else {
            let as_of = query
                .as_of
                .unwrap_or_else(|| Utc::now().with_timezone(&SOURCE_TIMEZONE).date_naive());
            self.query_shifted(query, day, tz, as_of).await?
        };

        timer.finish_with_info(&format!(
            "{} items in {} (day: {})",
            result.items.len(),
            result.timezone,
            day.map(|d| d.as_str()).unwrap_or("any")
        ));
        Ok(result)
    }

    async fn query_source_zone(
        &self,
        query: &ScheduleQuery,
        day: Option<BroadcastDay>,
    ) -> AppResult<ScheduleResult> {
        let store_query = CatalogQuery {
            filter: query.filter(day.into_iter().collect()),
            sort: query.sort,
            skip: query.pagination.offset(),
            limit: query.pagination.limit(),
        };
        let page = self.store.query(EntityKind::Anime, &store_query).await?;

        let items = page
            .items
            .into_iter()
            .filter_map(Entity::into_anime)
            .map(|anime| ScheduleItem {
                local_broadcast: source_broadcast(&anime.broadcast),
                anime,
            })
            .collect();

        Ok(ScheduleResult {
            items,
            pagination: PageInfo::new(page.total, &query.pagination),
            timezone: SOURCE_TIMEZONE.name().to_string(),
        })
    }

    async fn query_shifted(
        &self,
        query: &ScheduleQuery,
        day: Option<BroadcastDay>,
        tz: Tz,
        as_of: NaiveDate,
    ) -> AppResult<ScheduleResult> {
        let days = day.map(|d| d.with_adjacent()).unwrap_or_default();
        let window = query.pagination.page as u64 * query.pagination.limit() * OVERFETCH_FACTOR;

        let mut store_query = CatalogQuery {
            filter: query.filter(days),
            sort: query.sort,
            skip: 0,
            limit: window,
        };
        let mut page = self.store.query(EntityKind::Anime, &store_query).await?;

        if self.config.total_mode == ScheduleTotalMode::Exact && page.total > page.items.len() as u64 {
            store_query.limit = page.total;
            page = self.store.query(EntityKind::Anime, &store_query).await?;
        }

        let store_total = page.total;
        let fetched = page.items.len() as u64;

        let mut items: Vec<ScheduleItem> = page
            .items
            .into_iter()
            .filter_map(Entity::into_anime)
            .map(|anime| ScheduleItem {
                local_broadcast: convert_broadcast_at(&anime.broadcast, tz, as_of),
                anime,
            })
            .filter(|item| day.map_or(true, |d| item.local_broadcast.day == d))
            .collect();

        items.sort_by(|a, b| compare_items(a, b, &query.sort));

        let filtered = items.len() as u64;
        let pagination = if fetched >= store_total {
            PageInfo::new(filtered, &query.pagination)
        } else {
            PageInfo::approximate(
                estimate_total(store_total, filtered, fetched),
                &query.pagination,
            )
        };

        let items = items
            .into_iter()
            .skip(query.pagination.offset() as usize)
            .take(query.pagination.limit() as usize)
            .collect();

        Ok(ScheduleResult {
            items,
            pagination,
            timezone: tz.name().to_string(),
        })
    }
}

/// `ceil(store_total * filtered / fetched)`
fn estimate_total(store_total: u64, filtered: u64, fetched: u64) -> u64 {
    if fetched == 0 {
        return 0;
    }
    (store_total * filtered).div_ceil(fetched)
}

fn compare_items(a: &ScheduleItem, b: &ScheduleItem, sort: &SortSpec) -> Ordering {
    if sort.key != SortKey::BroadcastTime {
        return compare_entities(
            &Entity::Anime(a.anime.clone()),
            &Entity::Anime(b.anime.clone()),
            sort,
        );
    }
    cmp_missing_last(
        a.local_broadcast.time.as_deref(),
        b.local_broadcast.time.as_deref(),
        sort.direction,
    )
    .then_with(|| a.anime.mal_id.cmp(&b.anime.mal_id))
}

fn source_broadcast(info: &BroadcastInfo) -> LocalBroadcast {
    LocalBroadcast {
        day: info.day,
        time: info.time.clone(),
        timezone: SOURCE_TIMEZONE.name().to_string(),
    }
}

/// Convert a stored broadcast into `tz` for the current week
pub fn convert_broadcast(info: &BroadcastInfo, tz: Tz) -> LocalBroadcast {
    let today = Utc::now().with_timezone(&SOURCE_TIMEZONE).date_naive();
    convert_broadcast_at(info, tz, today)
}

/// Convert a stored broadcast into `tz`, resolving DST for the week of `as_of`.
///
/// Without a time the day cannot shift and is kept as is. Without a day
/// (`Other`) the time is still converted but the day stays `Other`.
pub fn convert_broadcast_at(info: &BroadcastInfo, tz: Tz, as_of: NaiveDate) -> LocalBroadcast {
    let timezone = tz.name().to_string();
    let Some(time) = info.get_time() else {
        return LocalBroadcast {
            day: info.day,
            time: None,
            timezone,
        };
    };

    let date = match info.day.weekday() {
        Some(weekday) => {
            let monday = as_of - ChronoDuration::days(as_of.weekday().num_days_from_monday() as i64);
            monday + ChronoDuration::days(weekday.num_days_from_monday() as i64)
        }
        None => as_of,
    };

    let Some(source) = SOURCE_TIMEZONE
        .from_local_datetime(&date.and_time(time))
        .earliest()
    else {
        return LocalBroadcast {
            day: info.day,
            time: None,
            timezone,
        };
    };
    let local = source.with_timezone(&tz);

    LocalBroadcast {
        day: match info.day {
            BroadcastDay::Other => BroadcastDay::Other,
            _ => BroadcastDay::from_weekday(local.weekday()),
        },
        time: Some(local.format("%H:%M").to_string()),
        timezone,
    }
}
