//! Error types for playback management

use crate::engine::EngineError;
use tempo_core::TrackId;
use tempo_resolver::ResolverError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No playable source could be resolved for a track
    #[error("Track {track_id} is unplayable: {source}")]
    Unplayable {
        track_id: TrackId,
        #[source]
        source: ResolverError,
    },

    /// The player engine rejected a command
    #[error("Player engine error: {0}")]
    Engine(#[from] EngineError),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
