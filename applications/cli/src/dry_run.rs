//! Player engine that plays nothing
//!
//! The CLI has no audio output. This engine accepts every command and
//! records the media URLs it was asked to load, so a queue can be walked
//! through the real playback session.

use async_trait::async_trait;
use std::sync::Mutex;
use tempo_playback::{EngineError, PlayerEngine};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DryRunEngine {
    loaded: Mutex<Vec<String>>,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs loaded so far, oldest first
    pub fn loaded(&self) -> Vec<String> {
        self.loaded
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlayerEngine for DryRunEngine {
    async fn load(&self, url: &str) -> Result<(), EngineError> {
        debug!(url, "Dry-run load");
        self.loaded
            .lock()
            .map_err(|_| EngineError::Unavailable)?
            .push(url.to_string());
        Ok(())
    }

    async fn unload(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn play(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn pause(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<(), EngineError> {
        debug!(position_ms, "Dry-run seek");
        Ok(())
    }
}
