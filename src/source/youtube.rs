//! YouTube transcript fetching.

use super::TranscriptSegment;
use crate::error::{Result, SporError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
});
static TEXT_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("Invalid regex")
});
static START_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstart="([^"]*)""#).expect("Invalid regex"));
static DUR_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bdur="([^"]*)""#).expect("Invalid regex"));
static INLINE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Extract the video identifier from a watch link.
///
/// The identifier is whatever follows the first `v=` up to the next `&`.
pub fn extract_video_id(url: &str) -> Result<String> {
    let (_, after) = url.split_once("v=").ok_or_else(|| {
        SporError::TranscriptUnavailable(format!("No video id (v=...) found in link: {}", url))
    })?;

    let id = after.split('&').next().unwrap_or_default();

    if id.is_empty() {
        return Err(SporError::TranscriptUnavailable(format!(
            "Empty video id in link: {}",
            url
        )));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SporError::TranscriptUnavailable(format!(
            "Malformed video id '{}' in link: {}",
            id, url
        )));
    }

    Ok(id.to_string())
}

/// Capability for fetching a caption track by video id.
#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Fetch the ordered segments of a video's transcript.
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Turns a watch link into one transcript string.
#[derive(Clone)]
pub struct TranscriptFetcher {
    service: Arc<dyn TranscriptService>,
}

impl TranscriptFetcher {
    pub fn new(service: Arc<dyn TranscriptService>) -> Self {
        Self { service }
    }

    /// Fetch the full transcript for a link, segments joined by single spaces.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let video_id = extract_video_id(url)?;
        debug!("Fetching transcript for video {}", video_id);

        let segments = self.service.fetch_segments(&video_id).await?;
        info!("Fetched {} transcript segments", segments.len());

        Ok(join_segments(&segments))
    }
}

/// Concatenate segment texts in order with single-space separators.
fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// A caption track advertised by the player.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Transcript service backed by YouTube's caption tracks.
pub struct YoutubeTranscriptApi {
    client: reqwest::Client,
    languages: Vec<String>,
}

impl YoutubeTranscriptApi {
    /// Create a client preferring the given caption languages.
    pub fn new(languages: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SporError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, languages })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}{}", WATCH_URL, video_id))
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await
            .map_err(unreachable)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(too_many_requests());
        }

        response.text().await.map_err(unreachable)
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(unreachable)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(too_many_requests());
        }
        if !response.status().is_success() {
            return Err(SporError::TranscriptUnavailable(format!(
                "Player request for {} failed with HTTP {}",
                video_id,
                response.status()
            )));
        }

        response.json::<PlayerResponse>().await.map_err(|e| {
            SporError::TranscriptUnavailable(format!("Unexpected player response: {}", e))
        })
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<String> {
        let url = track.base_url.replace("&fmt=srv3", "");
        let response = self.client.get(url).send().await.map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(SporError::TranscriptUnavailable(format!(
                "Caption track request failed with HTTP {}",
                response.status()
            )));
        }

        response.text().await.map_err(unreachable)
    }
}

#[async_trait]
impl TranscriptService for YoutubeTranscriptApi {
    #[instrument(skip(self))]
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let html = self.fetch_watch_page(video_id).await?;
        if html.contains("class=\"g-recaptcha\"") {
            return Err(too_many_requests());
        }

        let api_key = extract_api_key(&html).ok_or_else(|| {
            SporError::TranscriptUnavailable(format!(
                "Could not read the video page for {}",
                video_id
            ))
        })?;

        let player = self.fetch_player(video_id, &api_key).await?;

        if let Some(status) = &player.playability_status {
            if status.status != "OK" {
                return Err(SporError::TranscriptUnavailable(format!(
                    "Video {} is unplayable: {}",
                    video_id,
                    status.reason.as_deref().unwrap_or(&status.status)
                )));
            }
        }

        let tracks = player
            .captions
            .and_then(|c| c.tracklist)
            .map(|t| t.caption_tracks)
            .unwrap_or_default();

        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            SporError::TranscriptUnavailable(format!(
                "Transcripts are disabled or unavailable for video {}",
                video_id
            ))
        })?;
        debug!(
            "Using {} caption track ({})",
            track.language_code,
            if track.is_generated() { "generated" } else { "manual" }
        );

        let xml = self.fetch_track(track).await?;
        let segments = parse_caption_xml(&xml);

        if segments.is_empty() {
            return Err(SporError::TranscriptUnavailable(format!(
                "Caption track for video {} is empty",
                video_id
            )));
        }

        Ok(segments)
    }
}

fn unreachable(e: reqwest::Error) -> SporError {
    SporError::TranscriptUnavailable(format!("Transcript service unreachable: {}", e))
}

fn too_many_requests() -> SporError {
    SporError::TranscriptUnavailable(
        "YouTube is refusing requests from this address (too many requests)".to_string(),
    )
}

/// Extract the innertube API key embedded in a watch page.
fn extract_api_key(html: &str) -> Option<String> {
    API_KEY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pick a caption track: manual in a preferred language, then generated,
/// then whatever comes first.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for generated in [false, true] {
        for lang in languages {
            if let Some(track) = tracks
                .iter()
                .find(|t| t.is_generated() == generated && t.language_code == *lang)
            {
                return Some(track);
            }
        }
    }
    tracks.first()
}

/// Parse a timedtext XML document into segments.
///
/// Inline formatting tags are stripped and entities decoded.
pub fn parse_caption_xml(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_ELEMENT_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let raw = caps.get(2)?.as_str();

            let start = attr_f64(&START_ATTR_RE, attrs);
            let duration = attr_f64(&DUR_ATTR_RE, attrs);

            let text = decode_entities(&decode_entities(raw));
            let text = INLINE_TAG_RE.replace_all(&text, "").into_owned();

            if text.is_empty() {
                None
            } else {
                Some(TranscriptSegment::new(text, start, duration))
            }
        })
        .collect()
}

fn attr_f64(re: &Regex, attrs: &str) -> f64 {
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

fn decode_entities(s: &str) -> String {
    match quick_xml::escape::unescape(s) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.to_string(),
    }
}
