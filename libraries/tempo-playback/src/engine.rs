//! Player engine seam
//!
//! Decoding and audio output live outside this crate. The session drives an
//! engine through [`PlayerEngine`] and learns about progress only from the
//! [`EngineStatus`] values the engine sends back on a channel.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a player engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The media URL could not be opened
    #[error("Failed to load media: {0}")]
    Load(String),

    /// A transport command (play, pause, seek) failed
    #[error("Engine command failed: {0}")]
    Command(String),

    /// The engine has been shut down
    #[error("Engine unavailable")]
    Unavailable,
}

/// Periodic progress report from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
    /// Set once when the loaded media reaches its end
    pub did_just_finish: bool,
}

/// Audio output backend
///
/// One media item is loaded at a time.
#[async_trait]
pub trait PlayerEngine: Send + Sync {
    /// Open `url`, replacing nothing; callers unload first
    async fn load(&self, url: &str) -> Result<(), EngineError>;

    /// Release the loaded media, if any
    async fn unload(&self) -> Result<(), EngineError>;

    async fn play(&self) -> Result<(), EngineError>;

    async fn pause(&self) -> Result<(), EngineError>;

    /// Jump to `position_ms` within the loaded media
    async fn seek(&self, position_ms: u64) -> Result<(), EngineError>;
}
