//! Session events
//!
//! Broadcast to every subscriber so a UI can mirror the session without
//! polling. One `PositionUpdate` is sent per applied engine status.

use crate::types::{PlaybackState, RepeatMode};
use serde::Serialize;
use tempo_core::TrackId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlaybackEvent {
    /// Session moved to `state`
    StateChanged { state: PlaybackState },

    /// A newly resolved track is playing
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
        /// Queue index, `None` for a direct play
        index: Option<usize>,
    },

    /// The engine reported the end of `track_id`
    TrackFinished { track_id: TrackId },

    PositionUpdate { position_ms: u64, duration_ms: u64 },

    /// Queue replaced; `length` is the new size
    QueueChanged { length: usize },

    RepeatModeChanged { mode: RepeatMode },

    /// A failure was surfaced to the caller
    Error { message: String },
}
