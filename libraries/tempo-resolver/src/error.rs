//! Error types for stream resolution.

use thiserror::Error;

/// Errors that can occur while resolving a content id to an audio stream.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The metadata endpoint could not be reached or answered with a
    /// non-success status
    #[error("Transport failure{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// HTTP client error while reading a response
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response parsed but carried no audio encoding
    #[error("No audio format available for {content_id}")]
    NoAudioFormat { content_id: String },

    /// Failed to parse an upstream response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Every attempt failed
    #[error("All {attempts} attempts failed, last error: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<ResolverError>,
    },

    /// Invalid endpoint URL in configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The remote capability document could not be fetched or applied
    #[error("Remote config error: {0}")]
    RemoteConfig(String),
}

impl ResolverError {
    /// Create a transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Whether the error came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Request(_))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
