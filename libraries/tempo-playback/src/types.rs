//! Core types for playback management

use serde::{Deserialize, Serialize};
use tempo_core::Track;
use tempo_resolver::DeviceProfileKind;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded
    #[default]
    Idle,

    /// Resolving and loading a track
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
///
/// Shuffle is a repeat mode here: when it is active, advancing picks a random
/// queue index instead of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Advance linearly, wrapping at the ends
    #[default]
    Off,

    /// Loop current track only
    RepeatOne,

    /// Advance to a random index
    Shuffle,
}

impl RepeatMode {
    /// Off → RepeatOne → Shuffle → Off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::RepeatOne,
            Self::RepeatOne => Self::Shuffle,
            Self::Shuffle => Self::Off,
        }
    }
}

/// Configuration for the playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Device profile tried first when resolving (default: Android)
    pub default_profile: DeviceProfileKind,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Capacity of the engine status channel (default: 64)
    pub status_buffer: usize,

    /// Capacity of the event broadcast channel (default: 128)
    pub event_buffer: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_profile: DeviceProfileKind::Android,
            repeat: RepeatMode::Off,
            status_buffer: 64,
            event_buffer: 128,
        }
    }
}

/// Read-only view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub current_index: Option<usize>,
    pub queue_len: usize,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_busy: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub repeat_mode: RepeatMode,
}
