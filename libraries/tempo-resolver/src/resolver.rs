//! Stream resolver
//!
//! Turns a content id into a directly fetchable audio URL by asking the
//! upstream player endpoint while presenting one of the device profiles.

use crate::error::{ResolverError, Result};
use crate::format::{merge_formats, select_best_audio};
use crate::nonce::{generate_nonce, QUERY_NONCE_LENGTH};
use crate::profile::{DeviceProfileKind, ProfileStore};
use crate::types::{Encoding, PlayerResponse, ResolvedSource, ResolverConfig};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Header carrying the API format version
const API_FORMAT_VERSION_HEADER: &str = "X-Goog-Api-Format-Version";

/// Anything that can resolve a content id to a playable source.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve `content_id` presenting the `kind` device profile
    async fn resolve(&self, content_id: &str, kind: DeviceProfileKind) -> Result<ResolvedSource>;
}

/// HTTP-backed resolver.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tempo_resolver::{DeviceProfileKind, ProfileStore, ResolverConfig, StreamResolver};
///
/// let profiles = Arc::new(ProfileStore::new());
/// let resolver = StreamResolver::new(&ResolverConfig::default(), profiles)?;
///
/// let source = resolver.resolve("dQw4w9WgXcQ", DeviceProfileKind::Android).await?;
/// println!("{} kbit/s: {}", source.encoding.bitrate / 1000, source.encoding.url);
/// ```
#[derive(Debug, Clone)]
pub struct StreamResolver {
    http: Client,
    endpoint: String,
    profiles: Arc<ProfileStore>,
}

impl StreamResolver {
    /// Create a resolver sharing `profiles` with the remote config client.
    pub fn new(config: &ResolverConfig, profiles: Arc<ProfileStore>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ResolverError::Request)?;

        Ok(Self {
            http,
            endpoint: config.player_endpoint.clone(),
            profiles,
        })
    }

    /// Fetch and parse the raw player response.
    pub async fn fetch_player(
        &self,
        content_id: &str,
        kind: DeviceProfileKind,
    ) -> Result<PlayerResponse> {
        let profile = self.profiles.snapshot(kind);
        let body = profile.build_body(content_id);
        let t = generate_nonce(QUERY_NONCE_LENGTH);

        debug!(content_id, profile = %kind, "Requesting player response");

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("prettyPrint", "false"), ("t", t.as_str()), ("id", content_id)])
            .header(USER_AGENT, profile.user_agent.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(API_FORMAT_VERSION_HEADER, "2")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                self.profiles.mark_failure();
                ResolverError::transport(e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            self.profiles.mark_failure();
            let error_text = response.text().await.unwrap_or_default();
            warn!(content_id, status = status.as_u16(), "Player request rejected");
            return Err(ResolverError::transport(Some(status.as_u16()), error_text));
        }

        let text = response.text().await.map_err(|e| {
            self.profiles.mark_failure();
            ResolverError::transport(None, e.to_string())
        })?;

        let parsed: PlayerResponse = serde_json::from_str(&text)
            .map_err(|e| ResolverError::Parse(format!("Failed to parse player response: {}", e)))?;

        if let Some(playability) = &parsed.playability_status {
            if !playability.is_ok() {
                warn!(
                    content_id,
                    status = %playability.status,
                    reason = playability.reason.as_deref().unwrap_or(""),
                    "Content reported as not playable"
                );
            }
        }

        Ok(parsed)
    }

    /// Every usable encoding upstream offers, muxed first then adaptive.
    pub async fn formats(&self, content_id: &str, kind: DeviceProfileKind) -> Result<Vec<Encoding>> {
        let response = self.fetch_player(content_id, kind).await?;
        Ok(response
            .streaming_data
            .as_ref()
            .map(merge_formats)
            .unwrap_or_default())
    }
}

#[async_trait]
impl SourceResolver for StreamResolver {
    async fn resolve(&self, content_id: &str, kind: DeviceProfileKind) -> Result<ResolvedSource> {
        let response = self.fetch_player(content_id, kind).await?;

        let encodings = response
            .streaming_data
            .as_ref()
            .map(merge_formats)
            .unwrap_or_default();

        let encoding = select_best_audio(&encodings)
            .cloned()
            .ok_or_else(|| ResolverError::NoAudioFormat {
                content_id: content_id.to_string(),
            })?;

        let details = response.video_details.unwrap_or_default();

        info!(
            content_id,
            profile = %kind,
            mime = %encoding.mime_type,
            bitrate = encoding.bitrate,
            "Resolved audio stream"
        );

        Ok(ResolvedSource {
            encoding,
            title: details.title,
            author: details.author,
            length_seconds: details.length_seconds.and_then(|s| s.parse().ok()),
            profile: kind,
        })
    }
}
