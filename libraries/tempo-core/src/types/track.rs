//! Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Placeholder shown when neither the caller nor upstream provides a title
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Placeholder shown when upstream provides no channel name
pub const UNKNOWN_ARTIST: &str = "Unknown channel";

/// A playable track
///
/// Identity is `id`; the other fields are display metadata. Values are
/// immutable: changing metadata produces a new `Track` with the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Upstream content identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist or channel name
    pub artist: String,

    /// Artwork URL
    pub poster_url: String,
}

impl Track {
    /// Create a track with the default upstream poster
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        let id = id.into();
        let poster_url = Self::default_poster_url(&id);
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            poster_url,
        }
    }

    /// Create a track with an explicit poster URL
    pub fn with_poster(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        poster_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            poster_url: poster_url.into(),
        }
    }

    /// Thumbnail URL the upstream serves for a content id
    pub fn default_poster_url(id: &TrackId) -> String {
        format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id.as_str())
    }

    /// Whether two tracks refer to the same content
    pub fn same_identity(&self, other: &Track) -> bool {
        self.id == other.id
    }

    /// Return a copy with replaced display metadata
    ///
    /// `None` keeps the current value.
    #[must_use]
    pub fn with_metadata(&self, title: Option<&str>, artist: Option<&str>) -> Self {
        Self {
            id: self.id.clone(),
            title: title.map_or_else(|| self.title.clone(), str::to_string),
            artist: artist.map_or_else(|| self.artist.clone(), str::to_string),
            poster_url: self.poster_url.clone(),
        }
    }
}
