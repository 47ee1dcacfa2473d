//! Tempo Player Core
//!
//! Domain types shared by the stream resolver and the playback engine.
//!
//! # Example
//!
//! ```rust
//! use tempo_core::{Track, TrackId};
//!
//! let track = Track::new("dQw4w9WgXcQ", "Some Song", "Some Channel");
//! assert_eq!(track.id, TrackId::new("dQw4w9WgXcQ"));
//! assert!(track.poster_url.ends_with("maxresdefault.jpg"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{Track, TrackId, UNKNOWN_ARTIST, UNKNOWN_TITLE};
