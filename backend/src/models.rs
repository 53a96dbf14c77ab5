use crate::error::ConfigError;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::{response, FromForm, Response};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

pub const DEFAULT_DAYS: u32 = 3;
pub const MAX_DAYS: u32 = 30;
pub const DEFAULT_MAX_RESULTS: u32 = 50;
pub const ALLOWED_MAX_RESULTS: [u32; 3] = [10, 25, 50];
pub const MAX_SUBSCRIBER_CAP: u64 = 100_000_000;

/// Relevance-language hint passed to the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Any,
    English,
    Urdu,
    Hindi,
    Punjabi,
    Arabic,
}

impl Language {
    pub fn relevance_code(&self) -> Option<&'static str> {
        match self {
            Language::Any => None,
            Language::English => Some("en"),
            Language::Urdu => Some("ur"),
            Language::Hindi => Some("hi"),
            Language::Punjabi => Some("pa"),
            Language::Arabic => Some("ar"),
        }
    }

    /// Accepts either the ISO code or the display name.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "any" => Some(Language::Any),
            "en" | "english" => Some(Language::English),
            "ur" | "urdu" => Some(Language::Urdu),
            "hi" | "hindi" => Some(Language::Hindi),
            "pa" | "punjabi" => Some(Language::Punjabi),
            "ar" | "arabic" => Some(Language::Arabic),
            _ => None,
        }
    }
}

/// Coarse duration bucket understood by the search endpoint (`videoDuration`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
    Any,
    Short,  // < 4 min
    Medium, // 4-20 min
    Long,   // > 20 min
}

impl DurationClass {
    pub fn as_param(&self) -> &'static str {
        match self {
            DurationClass::Any => "any",
            DurationClass::Short => "short",
            DurationClass::Medium => "medium",
            DurationClass::Long => "long",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "any" => Some(DurationClass::Any),
            "short" => Some(DurationClass::Short),
            "medium" => Some(DurationClass::Medium),
            "long" => Some(DurationClass::Long),
            _ => None,
        }
    }
}

/// Raw query parameters of the `/api/viral` routes.
///
/// Values stay as text so a malformed one is rejected instead of being
/// replaced by its default.
#[derive(Debug, Default, FromForm)]
pub struct ViralQuery {
    pub keywords: Vec<String>,
    pub days: Option<String>,
    pub max_results: Option<String>,
    pub exclude_shorts: Option<String>,
    pub max_subs: Option<String>,
    pub language: Option<String>,
    pub duration: Option<String>,
    /// Table column to order by (table route only).
    pub sort: Option<String>,
    pub order: Option<String>,
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<&str>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid(name, format!("'{raw}' is not a valid number"))),
    }
}

fn parse_flag(name: &'static str, raw: Option<&str>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(name, format!("'{raw}' is not a boolean"))),
    }
}

/// Everything a single run needs, fixed before the first request goes out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub keywords: Vec<String>,
    pub days: u32,
    pub max_results: u32,
    pub exclude_shorts: bool,
    pub max_subs: u64,
    pub language: Language,
    pub duration_class: Option<DurationClass>,
}

impl RunConfig {
    /// Run over `keywords` with every other setting at its default.
    pub fn with_keywords<I, S>(keywords: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_query(ViralQuery {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Default::default()
        })
    }

    pub fn from_query(query: ViralQuery) -> Result<Self, ConfigError> {
        // A single value may carry a whole text-area of keywords.
        let keywords: Vec<String> = query
            .keywords
            .iter()
            .flat_map(|k| k.split('\n'))
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        if keywords.is_empty() {
            return Err(ConfigError::NoKeywords);
        }

        let days: u32 = parse_number("days", query.days.as_deref(), DEFAULT_DAYS)?;
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(ConfigError::invalid(
                "days",
                format!("{days} is outside 1..={MAX_DAYS}"),
            ));
        }

        let max_results: u32 =
            parse_number("max_results", query.max_results.as_deref(), DEFAULT_MAX_RESULTS)?;
        if !ALLOWED_MAX_RESULTS.contains(&max_results) {
            return Err(ConfigError::invalid(
                "max_results",
                format!("{max_results} is not one of {ALLOWED_MAX_RESULTS:?}"),
            ));
        }

        let max_subs: u64 = parse_number("max_subs", query.max_subs.as_deref(), 0)?;
        if max_subs > MAX_SUBSCRIBER_CAP {
            return Err(ConfigError::invalid(
                "max_subs",
                format!("{max_subs} exceeds {MAX_SUBSCRIBER_CAP}"),
            ));
        }

        let language = match query.language.as_deref() {
            None => Language::Any,
            Some(raw) => Language::parse(raw)
                .ok_or_else(|| ConfigError::invalid("language", format!("unknown '{raw}'")))?,
        };

        let duration_class = match query.duration.as_deref() {
            None => None,
            Some(raw) => Some(
                DurationClass::parse(raw)
                    .ok_or_else(|| ConfigError::invalid("duration", format!("unknown '{raw}'")))?,
            ),
        };

        let exclude_shorts = parse_flag("exclude_shorts", query.exclude_shorts.as_deref(), true)?;

        Ok(RunConfig {
            keywords,
            days,
            max_results,
            exclude_shorts,
            max_subs,
            language,
            duration_class,
        })
    }
}

/// One item of a search response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub published_at: String,
}

/// Statistics, content details and snippet language of one video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub video_id: String,
    pub views: u64,
    pub duration_secs: u64,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    pub channel_id: String,
    /// `None` when the owner hides the count. Not the same as zero.
    pub subscribers: Option<u64>,
}

/// A video surfaced by search, carrying the metadata of its first sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub keyword: String,
    pub title: String,
    pub channel: String,
    pub channel_id: String,
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub keyword: String,
    pub title: String,
    pub channel: String,
    pub subscribers: Option<u64>,
    pub language: String,
    pub duration_sec: u64,
    pub published_at: String,
    pub views: u64,
    pub views_per_day: f64,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Found,
    NoCandidates,
    NoRowsAfterFiltering,
}

impl RunOutcome {
    pub fn message(&self, rows: usize) -> String {
        match self {
            RunOutcome::Found => format!("Found {rows} videos. Sorted by Views/Day (viral speed)."),
            RunOutcome::NoCandidates => {
                "No videos collected. Try increasing days or turning off Exclude Shorts.".to_string()
            }
            RunOutcome::NoRowsAfterFiltering => {
                "No videos left after filtering. Try relaxing the shorts or subscriber filters."
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueScope {
    Search,
    Channels,
    Videos,
}

/// A request that failed during a run and whose contribution was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIssue {
    pub scope: IssueScope,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralReport {
    pub outcome: RunOutcome,
    pub message: String,
    pub candidates_found: usize,
    pub rows: Vec<ResultRow>,
    pub issues: Vec<RunIssue>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip, default = "default_error_status")]
    pub status: Status,
}

fn default_error_status() -> Status {
    Status::BadRequest
}

impl ErrorResponse {
    pub fn new(status: Status, error: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            message: message.into(),
            status,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

/// CSV body served as a file download.
pub struct CsvDownload {
    pub filename: &'static str,
    pub body: String,
}

impl<'r> Responder<'r, 'static> for CsvDownload {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .status(Status::Ok)
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}
