//! Playback queue
//!
//! An ordered track list with an optional current position. Navigation
//! wraps at both ends; in shuffle mode it jumps to a random index.

use crate::error::{PlaybackError, Result};
use crate::shuffle::random_index;
use crate::types::RepeatMode;
use tempo_core::{Track, TrackId};

/// Ordered list of tracks and the index being played
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,

    /// `None` when no queue item is active
    current_index: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all tracks and reset the position
    pub fn set(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current_index = None;
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.set(Vec::new());
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First index holding `id`
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Move the position; `None` deselects
    pub fn set_current(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            if i >= self.tracks.len() {
                return Err(PlaybackError::IndexOutOfBounds(i));
            }
        }
        self.current_index = index;
        Ok(())
    }

    /// Index to play after the current one
    ///
    /// With no current index, linear mode starts at 0.
    pub fn next_index(&self, mode: RepeatMode) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        if mode == RepeatMode::Shuffle {
            return random_index(len);
        }
        match self.current_index {
            Some(i) => Some((i + 1) % len),
            None => Some(0),
        }
    }

    /// Index to play before the current one
    ///
    /// With no current index, linear mode starts at the last track.
    pub fn previous_index(&self, mode: RepeatMode) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        if mode == RepeatMode::Shuffle {
            return random_index(len);
        }
        match self.current_index {
            Some(i) => Some((i + len - 1) % len),
            None => Some(len - 1),
        }
    }
}
