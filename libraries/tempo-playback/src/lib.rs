//! Tempo Player - Playback Management
//!
//! This crate provides:
//! - An ordered queue with wraparound navigation
//! - Repeat modes (Off, RepeatOne, Shuffle)
//! - A single-active-track playback session that resolves tracks through a
//!   [`tempo_resolver::SourceResolver`] and drives a [`PlayerEngine`]
//! - Playback events over a broadcast channel
//!
//! # Architecture
//!
//! Audio decoding and output are not part of this crate. Platforms provide
//! them by implementing [`PlayerEngine`] and by sending [`EngineStatus`]
//! reports back to the session.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use tempo_core::TrackId;
//! use tempo_playback::{EngineError, PlaybackConfig, PlaybackSession, PlayerEngine};
//! use tempo_resolver::{ProfileStore, ResolverConfig, RetryController, RetryPolicy, StreamResolver};
//!
//! struct NullEngine;
//!
//! #[async_trait]
//! impl PlayerEngine for NullEngine {
//!     async fn load(&self, _url: &str) -> Result<(), EngineError> { Ok(()) }
//!     async fn unload(&self) -> Result<(), EngineError> { Ok(()) }
//!     async fn play(&self) -> Result<(), EngineError> { Ok(()) }
//!     async fn pause(&self) -> Result<(), EngineError> { Ok(()) }
//!     async fn seek(&self, _position_ms: u64) -> Result<(), EngineError> { Ok(()) }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = StreamResolver::new(&ResolverConfig::default(), Arc::new(ProfileStore::new()))?;
//! let controller = RetryController::new(resolver, RetryPolicy::default());
//!
//! let session = Arc::new(PlaybackSession::new(
//!     Arc::new(NullEngine),
//!     Arc::new(controller),
//!     PlaybackConfig::default(),
//! ));
//! let (_status_tx, status_rx) = session.status_channel();
//! session.spawn_status_loop(status_rx);
//!
//! session
//!     .play_track_by_id(&TrackId::new("dQw4w9WgXcQ"), Some("Song"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod events;
mod queue;
mod session;
pub mod shuffle;
pub mod types;

// Public exports
pub use engine::{EngineError, EngineStatus, PlayerEngine};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::Queue;
pub use session::{PlayOutcome, PlaybackSession};
pub use types::{PlaybackConfig, PlaybackSnapshot, PlaybackState, RepeatMode};
