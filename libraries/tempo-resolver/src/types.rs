//! Types for upstream requests and responses.

use crate::error::{ResolverError, Result};
use crate::profile::DeviceProfileKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default upstream player endpoint
pub const DEFAULT_PLAYER_ENDPOINT: &str = "https://youtubei.googleapis.com/youtubei/v1/player";

/// Default location of the remote capability document
pub const DEFAULT_REMOTE_CONFIG_URL: &str = "https://st.onvo.me/config.json";

/// Configuration for the stream resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Player metadata endpoint
    pub player_endpoint: String,
    /// Remote capability document URL
    pub remote_config_url: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl ResolverConfig {
    /// Config pointing at custom endpoints, default timeouts
    pub fn new(player_endpoint: impl Into<String>, remote_config_url: impl Into<String>) -> Self {
        Self {
            player_endpoint: player_endpoint.into(),
            remote_config_url: remote_config_url.into(),
            ..Self::default()
        }
    }

    /// Check that both endpoints are absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        validate_url("player endpoint", &self.player_endpoint)?;
        validate_url("remote config URL", &self.remote_config_url)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            player_endpoint: DEFAULT_PLAYER_ENDPOINT.to_string(),
            remote_config_url: DEFAULT_REMOTE_CONFIG_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

fn validate_url(what: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(ResolverError::InvalidUrl(format!("{what} cannot be empty")));
    }

    let parsed = url::Url::parse(raw)
        .map_err(|e| ResolverError::InvalidUrl(format!("{what} {raw:?}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ResolverError::InvalidUrl(format!(
            "{what} must use http:// or https://, got {other}://"
        ))),
    }
}

// =============================================================================
// Player response
// =============================================================================

/// Subset of the player response the resolver reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub streaming_data: Option<StreamingData>,
    #[serde(default)]
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PlayabilityStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// The two encoding collections
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    /// Muxed (non-adaptive) formats
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    /// Adaptive (single-track) formats
    #[serde(default)]
    pub adaptive_formats: Vec<RawFormat>,
}

/// One encoding entry as upstream sends it.
///
/// Everything is optional on the wire; [`Encoding::from_raw`] decides what is
/// required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormat {
    #[serde(default)]
    pub itag: Option<u32>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content_length: Option<String>,
    #[serde(default)]
    pub audio_sample_rate: Option<String>,
    #[serde(default)]
    pub approx_duration_ms: Option<String>,
    #[serde(default)]
    pub audio_quality: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub length_seconds: Option<String>,
}

// =============================================================================
// Resolved types
// =============================================================================

/// A playable upstream encoding. Valid only for the resolved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoding {
    pub mime_type: String,
    /// Value of the `codecs` MIME parameter, e.g. `opus` or `mp4a.40.2`
    pub codec: Option<String>,
    /// Bits per second
    pub bitrate: u64,
    pub url: String,
    pub itag: Option<u32>,
    pub content_length: Option<u64>,
    pub audio_sample_rate: Option<u32>,
    pub approx_duration_ms: Option<u64>,
    pub audio_quality: Option<String>,
}

impl Encoding {
    /// Convert a wire entry; entries without a MIME type or URL are unusable
    pub fn from_raw(raw: &RawFormat) -> Option<Self> {
        let mime_type = raw.mime_type.clone()?;
        let url = raw.url.clone()?;

        Some(Self {
            codec: parse_codec(&mime_type),
            mime_type,
            bitrate: raw.bitrate.unwrap_or(0),
            url,
            itag: raw.itag,
            content_length: raw.content_length.as_deref().and_then(|v| v.parse().ok()),
            audio_sample_rate: raw.audio_sample_rate.as_deref().and_then(|v| v.parse().ok()),
            approx_duration_ms: raw.approx_duration_ms.as_deref().and_then(|v| v.parse().ok()),
            audio_quality: raw.audio_quality.clone(),
        })
    }

    /// Whether the MIME type indicates an audio track
    pub fn is_audio(&self) -> bool {
        self.mime_type.contains("audio/")
    }
}

/// Extract the `codecs="..."` parameter from a MIME type
pub fn parse_codec(mime_type: &str) -> Option<String> {
    let start = mime_type.find("codecs=")? + "codecs=".len();
    let codec = mime_type[start..]
        .trim_start_matches('"')
        .split('"')
        .next()?
        .trim();

    if codec.is_empty() {
        None
    } else {
        Some(codec.to_string())
    }
}

/// Result of resolving one content id under one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSource {
    pub encoding: Encoding,
    /// Upstream title; authoritative over caller hints
    pub title: Option<String>,
    /// Upstream channel name
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
    /// Profile that produced this result
    pub profile: DeviceProfileKind,
}

// =============================================================================
// Remote capability document
// =============================================================================

/// Remote document used to hot-patch the Android profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigDocument {
    pub version: f64,
    /// Replacement request payload
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// Replacement User-Agent
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub force_update: bool,
}
