use crate::error::{ConfigError, RequestError};
use crate::models::{
    IssueScope, ResultRow, RunConfig, RunIssue, RunOutcome, VideoDetails, ViralReport,
};
use crate::services::candidates::CandidateSet;
use crate::services::youtube::{SearchRequest, VideoPlatform, BATCH_SIZE};
use crate::utils::{
    age_in_days, compare_with_order_float, parse_published_at, video_url, views_per_day,
    SortOrder,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{error, info, warn};
use std::collections::HashMap;

/// Videos shorter than this count as Shorts.
pub const SHORTS_THRESHOLD_SECS: u64 = 60;

/// Runs one search-enrich-filter pass. Every request is awaited before the
/// next one is sent.
///
/// Failed requests are collected in [`ViralReport::issues`] and never abort
/// the run; only an invalid `config` does.
pub async fn run_viral_search(
    platform: &dyn VideoPlatform,
    config: &RunConfig,
    now: DateTime<Utc>,
) -> Result<ViralReport, ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::NoKeywords);
    }

    let mut issues = Vec::new();

    let candidates = collect_candidates(platform, config, now, &mut issues).await;
    if candidates.is_empty() {
        warn!("No candidates collected for {} keywords", config.keywords.len());
        return Ok(report(RunOutcome::NoCandidates, 0, Vec::new(), issues));
    }
    info!("Collected {} candidate videos", candidates.len());

    let subscribers =
        fetch_channel_subscribers(platform, &candidates.channel_ids(), &mut issues).await;
    let details = fetch_video_details(platform, &candidates.video_ids(), &mut issues).await;

    let mut rows = derive_rows(&candidates, &details, &subscribers, config, now);
    if rows.is_empty() {
        warn!("All {} candidates were filtered out", candidates.len());
        return Ok(report(
            RunOutcome::NoRowsAfterFiltering,
            candidates.len(),
            rows,
            issues,
        ));
    }

    sort_rows(&mut rows);
    info!("Produced {} rows", rows.len());
    Ok(report(RunOutcome::Found, candidates.len(), rows, issues))
}

fn report(
    outcome: RunOutcome,
    candidates_found: usize,
    rows: Vec<ResultRow>,
    issues: Vec<RunIssue>,
) -> ViralReport {
    ViralReport {
        outcome,
        message: outcome.message(rows.len()),
        candidates_found,
        rows,
        issues,
    }
}

fn record_issue(issues: &mut Vec<RunIssue>, scope: IssueScope, target: String, e: RequestError) {
    error!("{scope:?} request for {target} failed: {e}");
    issues.push(RunIssue {
        scope,
        target,
        message: e.to_string(),
    });
}

/// Lower publish bound for a window of `days`, e.g. `2026-10-16T09:30:00Z`.
pub fn published_after(now: DateTime<Utc>, days: u32) -> String {
    (now - Duration::days(i64::from(days))).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub async fn collect_candidates(
    platform: &dyn VideoPlatform,
    config: &RunConfig,
    now: DateTime<Utc>,
    issues: &mut Vec<RunIssue>,
) -> CandidateSet {
    let mut candidates = CandidateSet::new();
    let after = published_after(now, config.days);

    for keyword in &config.keywords {
        info!("Searching: {keyword}");

        let request = SearchRequest {
            query: keyword.clone(),
            published_after: after.clone(),
            max_results: config.max_results,
            relevance_language: config.language.relevance_code().map(String::from),
            duration_class: config.duration_class,
        };

        let hits = match platform.search(&request).await {
            Ok(hits) => hits,
            Err(e) => {
                record_issue(issues, IssueScope::Search, keyword.clone(), e);
                continue;
            }
        };

        if hits.is_empty() {
            warn!("No videos found for: {keyword}");
            continue;
        }

        let mut added = 0;
        for hit in hits {
            if candidates.insert_if_absent(keyword, hit) {
                added += 1;
            }
        }
        info!("Keyword '{keyword}' added {added} new videos");
    }

    candidates
}

fn batch_label(batch: usize, total: usize) -> String {
    format!("batch {}/{}", batch + 1, total)
}

/// Subscriber count per channel; `None` marks a hidden count.
/// Channels from failed batches are simply absent.
pub async fn fetch_channel_subscribers(
    platform: &dyn VideoPlatform,
    channel_ids: &[String],
    issues: &mut Vec<RunIssue>,
) -> HashMap<String, Option<u64>> {
    let mut subscribers = HashMap::new();
    let batches = channel_ids.len().div_ceil(BATCH_SIZE);

    for (n, batch) in channel_ids.chunks(BATCH_SIZE).enumerate() {
        match platform.channel_stats(batch).await {
            Ok(stats) => {
                for channel in stats {
                    subscribers.insert(channel.channel_id, channel.subscribers);
                }
            }
            Err(e) => record_issue(issues, IssueScope::Channels, batch_label(n, batches), e),
        }
    }

    info!(
        "Fetched subscriber counts for {}/{} channels",
        subscribers.len(),
        channel_ids.len()
    );
    subscribers
}

pub async fn fetch_video_details(
    platform: &dyn VideoPlatform,
    video_ids: &[String],
    issues: &mut Vec<RunIssue>,
) -> HashMap<String, VideoDetails> {
    let mut details = HashMap::new();
    let batches = video_ids.len().div_ceil(BATCH_SIZE);

    for (n, batch) in video_ids.chunks(BATCH_SIZE).enumerate() {
        match platform.video_details(batch).await {
            Ok(videos) => {
                for video in videos {
                    details.insert(video.video_id.clone(), video);
                }
            }
            Err(e) => record_issue(issues, IssueScope::Videos, batch_label(n, batches), e),
        }
    }

    info!("Fetched details for {}/{} videos", details.len(), video_ids.len());
    details
}

/// Joins candidates with their enrichment and applies the filters, in
/// discovery order.
pub fn derive_rows(
    candidates: &CandidateSet,
    details: &HashMap<String, VideoDetails>,
    subscribers: &HashMap<String, Option<u64>>,
    config: &RunConfig,
    now: DateTime<Utc>,
) -> Vec<ResultRow> {
    let mut rows = Vec::new();

    for candidate in candidates.iter() {
        let Some(video) = details.get(&candidate.video_id) else {
            continue;
        };
        let Some(published) = parse_published_at(&candidate.published_at) else {
            continue;
        };

        if config.exclude_shorts && video.duration_secs < SHORTS_THRESHOLD_SECS {
            continue;
        }

        let subs = subscribers.get(&candidate.channel_id).copied().flatten();
        if config.max_subs > 0 && subs.is_some_and(|count| count > config.max_subs) {
            continue;
        }

        let age = age_in_days(published, now);
        rows.push(ResultRow {
            keyword: candidate.keyword.clone(),
            title: candidate.title.clone(),
            channel: candidate.channel.clone(),
            subscribers: subs,
            language: video.language.clone(),
            duration_sec: video.duration_secs,
            published_at: candidate.published_at.clone(),
            views: video.views,
            views_per_day: views_per_day(video.views, age),
            url: video_url(&candidate.video_id),
        });
    }

    rows
}

/// Fastest first. Stable, so ties keep discovery order.
pub fn sort_rows(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| compare_with_order_float(a.views_per_day, b.views_per_day, SortOrder::Desc));
}
