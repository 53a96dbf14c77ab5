#![allow(dead_code)]

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use viral_topics::error::RequestError;
use viral_topics::models::{ChannelStats, SearchHit, VideoDetails};
use viral_topics::services::youtube::{SearchRequest, VideoPlatform};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(SearchRequest),
    Videos(Vec<String>),
    Channels(Vec<String>),
}

/// In-memory stand-in for the platform. Records every call in order.
#[derive(Default)]
pub struct FakePlatform {
    pub search_results: HashMap<String, Vec<SearchHit>>,
    pub failing_keywords: HashSet<String>,
    pub videos: HashMap<String, VideoDetails>,
    pub channels: HashMap<String, Option<u64>>,
    pub fail_video_batches: bool,
    pub fail_channel_batches: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a video found by `keyword`, with its details and channel.
    pub fn with_video(mut self, keyword: &str, video: TestVideo) -> Self {
        self.search_results
            .entry(keyword.to_string())
            .or_default()
            .push(video.hit());
        self.videos.insert(
            video.id.clone(),
            VideoDetails {
                video_id: video.id.clone(),
                views: video.views,
                duration_secs: video.duration_secs,
                language: video.language.clone(),
            },
        );
        self.channels
            .entry(video.channel_id.clone())
            .or_insert(video.subscribers);
        self
    }

    pub fn failing_search(mut self, keyword: &str) -> Self {
        self.failing_keywords.insert(keyword.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn channel_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Channels(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn video_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Videos(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(request) => Some(request),
                _ => None,
            })
            .collect()
    }
}

fn unavailable() -> RequestError {
    RequestError::Status {
        status: 503,
        body: "backend unavailable".to_string(),
    }
}

#[rocket::async_trait]
impl VideoPlatform for FakePlatform {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, RequestError> {
        self.calls.lock().unwrap().push(Call::Search(request.clone()));
        if self.failing_keywords.contains(&request.query) {
            return Err(RequestError::Status {
                status: 403,
                body: "quotaExceeded".to_string(),
            });
        }
        Ok(self
            .search_results
            .get(&request.query)
            .cloned()
            .unwrap_or_default())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, RequestError> {
        self.calls.lock().unwrap().push(Call::Videos(video_ids.to_vec()));
        if self.fail_video_batches {
            return Err(unavailable());
        }
        // Reversed so callers can't rely on response order.
        Ok(video_ids
            .iter()
            .rev()
            .filter_map(|id| self.videos.get(id).cloned())
            .collect())
    }

    async fn channel_stats(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, RequestError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Channels(channel_ids.to_vec()));
        if self.fail_channel_batches {
            return Err(unavailable());
        }
        Ok(channel_ids
            .iter()
            .filter_map(|id| {
                self.channels.get(id).map(|subs| ChannelStats {
                    channel_id: id.clone(),
                    subscribers: *subs,
                })
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct TestVideo {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub published_at: String,
    pub views: u64,
    pub duration_secs: u64,
    pub language: String,
    pub subscribers: Option<u64>,
}

impl TestVideo {
    /// 90 second video on its own channel with 500 subscribers.
    pub fn new(id: &str, published: DateTime<Utc>, views: u64) -> Self {
        TestVideo {
            id: id.to_string(),
            title: format!("Video {id}"),
            channel_id: format!("UC-{id}"),
            published_at: timestamp(published),
            views,
            duration_secs: 90,
            language: "en".to_string(),
            subscribers: Some(500),
        }
    }

    pub fn duration(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn subscribers(mut self, subscribers: Option<u64>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn channel(mut self, channel_id: &str) -> Self {
        self.channel_id = channel_id.to_string();
        self
    }

    pub fn published_at(mut self, raw: &str) -> Self {
        self.published_at = raw.to_string();
        self
    }

    pub fn hit(&self) -> SearchHit {
        SearchHit {
            video_id: self.id.clone(),
            title: self.title.clone(),
            channel_title: format!("Channel {}", self.channel_id),
            channel_id: self.channel_id.clone(),
            published_at: self.published_at.clone(),
        }
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}
