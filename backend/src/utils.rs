use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Smallest age a video can have, so brand-new uploads don't divide by zero.
pub const MIN_AGE_DAYS: f64 = 0.01;

const SECONDS_PER_DAY: f64 = 86_400.0;

static DURATION_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Parse an ISO8601 timestamp such as `2026-02-07T10:20:30Z`
pub fn parse_published_at(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }

    date_str
        .parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date_str).ok().map(|dt| dt.with_timezone(&Utc)))
}

fn duration_pattern() -> Option<&'static Regex> {
    DURATION_PATTERN
        .get_or_init(|| {
            Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?)?$").ok()
        })
        .as_ref()
}

/// Parse ISO8601 duration string (PT1H2M3S) to total seconds.
/// Missing components count as zero, fractional seconds are truncated, and
/// anything unparseable or too large for `u64` yields zero seconds.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> u64 {
    let Some(captures) = duration_pattern().and_then(|re| re.captures(duration_str.trim())) else {
        return 0;
    };

    let component = |idx: usize| -> Option<u64> {
        captures
            .get(idx)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };

    [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0u64, |total, (idx, unit)| {
            component(idx)?.checked_mul(unit)?.checked_add(total)
        })
        .unwrap_or(0)
}

/// Days between `published` and `now`, never below [`MIN_AGE_DAYS`].
pub fn age_in_days(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - published).num_milliseconds() as f64 / 1000.0;
    (elapsed / SECONDS_PER_DAY).max(MIN_AGE_DAYS)
}

pub fn views_per_day(views: u64, age_days: f64) -> f64 {
    round_to(views as f64 / age_days.max(MIN_AGE_DAYS), 2)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn compare_with_order_float(a: f64, b: f64, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        SortOrder::Desc => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
