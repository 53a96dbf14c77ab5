use crate::config::AppConfig;
use crate::error::RequestError;
use crate::models::{ChannelStats, DurationClass, SearchHit, VideoDetails};
use crate::utils::parse_iso8601_duration_to_seconds;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Most ids the platform accepts in one bulk lookup.
pub const BATCH_SIZE: usize = 50;

const ERROR_BODY_LIMIT: usize = 200;

/// Parameters of one keyword search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Lower publish bound, UTC with a trailing `Z`.
    pub published_after: String,
    pub max_results: u32,
    pub relevance_language: Option<String>,
    pub duration_class: Option<DurationClass>,
}

/// The three read endpoints a run depends on.
#[rocket::async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, RequestError>;

    /// At most [`BATCH_SIZE`] ids per call.
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, RequestError>;

    /// At most [`BATCH_SIZE`] ids per call.
    async fn channel_stats(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, RequestError>;
}

/// YouTube Data API v3 over reqwest.
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YouTubeClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        // Url::join drops the last path segment unless the base ends in '/'.
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(YouTubeClient {
            client,
            api_key: config.api_key.clone(),
            base_url: Url::parse(&base)?,
        })
    }

    async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, RequestError> {
        let url = self.base_url.join(endpoint)?;
        debug!("GET {url} {params:?}");

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[rocket::async_trait]
impl VideoPlatform for YouTubeClient {
    // Documentation: https://developers.google.com/youtube/v3/docs/search/list
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, RequestError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", request.query.clone()),
            ("type", "video".to_string()),
            ("order", "viewCount".to_string()),
            ("publishedAfter", request.published_after.clone()),
            ("maxResults", request.max_results.to_string()),
        ];
        if let Some(class) = request.duration_class {
            params.push(("videoDuration", class.as_param().to_string()));
        }
        if let Some(lang) = &request.relevance_language {
            params.push(("relevanceLanguage", lang.clone()));
        }

        let response = self.get_json("search", &params).await?;
        Ok(parse_search_items(&response))
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/videos
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>, RequestError> {
        let params = [
            ("part", "statistics,snippet,contentDetails".to_string()),
            ("id", video_ids.join(",")),
        ];

        let response = self.get_json("videos", &params).await?;
        Ok(parse_video_items(&response))
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/channels
    async fn channel_stats(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, RequestError> {
        let params = [
            ("part", "statistics".to_string()),
            ("id", channel_ids.join(",")),
        ];

        let response = self.get_json("channels", &params).await?;
        Ok(parse_channel_items(&response))
    }
}

fn items(response: &Value) -> &[Value] {
    response["items"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or("").to_string()
}

// Counts arrive as decimal strings; accept plain numbers too.
fn count(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

pub fn parse_search_items(response: &Value) -> Vec<SearchHit> {
    items(response)
        .iter()
        .filter_map(|item| {
            let video_id = item["id"]["videoId"].as_str()?;
            let snippet = &item["snippet"];
            Some(SearchHit {
                video_id: video_id.to_string(),
                title: text(&snippet["title"]),
                channel_title: text(&snippet["channelTitle"]),
                channel_id: text(&snippet["channelId"]),
                published_at: text(&snippet["publishedAt"]),
            })
        })
        .collect()
}

pub fn parse_video_items(response: &Value) -> Vec<VideoDetails> {
    items(response)
        .iter()
        .filter_map(|item| {
            let video_id = item["id"].as_str()?;
            let snippet = &item["snippet"];
            let language = [
                &snippet["defaultAudioLanguage"],
                &snippet["defaultLanguage"],
            ]
            .into_iter()
            .filter_map(Value::as_str)
            .find(|lang| !lang.is_empty())
            .unwrap_or("")
            .to_string();

            Some(VideoDetails {
                video_id: video_id.to_string(),
                views: count(&item["statistics"]["viewCount"]).unwrap_or(0),
                duration_secs: parse_iso8601_duration_to_seconds(
                    item["contentDetails"]["duration"].as_str().unwrap_or(""),
                ),
                language,
            })
        })
        .collect()
}

pub fn parse_channel_items(response: &Value) -> Vec<ChannelStats> {
    items(response)
        .iter()
        .filter_map(|item| {
            let channel_id = item["id"].as_str()?;
            let stats = &item["statistics"];
            let hidden = stats["hiddenSubscriberCount"].as_bool().unwrap_or(false);
            Some(ChannelStats {
                channel_id: channel_id.to_string(),
                subscribers: if hidden {
                    None
                } else {
                    count(&stats["subscriberCount"])
                },
            })
        })
        .collect()
}
