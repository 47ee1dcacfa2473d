//! Tempo Stream Resolver
//!
//! Resolves a content id to a directly playable audio URL by querying the
//! upstream player endpoint while impersonating an official mobile client.
//!
//! # Features
//!
//! - **Device profiles**: iOS and Android client templates, hot-patchable
//!   through a remote capability document
//! - **Format selection**: highest-bitrate audio encoding, plus codec and
//!   bitrate filters
//! - **Retries**: bounded attempts with backoff and profile fallback
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tempo_resolver::{
//!     DeviceProfileKind, ProfileStore, RemoteConfigClient, RemoteConfigWorker,
//!     ResolverConfig, RetryController, RetryPolicy, StreamResolver,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResolverConfig::default();
//!     let profiles = Arc::new(ProfileStore::new());
//!
//!     let (tx, rx) = RemoteConfigWorker::channel(8);
//!     RemoteConfigWorker::new(RemoteConfigClient::new(&config, Arc::clone(&profiles))?).spawn(rx);
//!
//!     let resolver = StreamResolver::new(&config, profiles)?;
//!     let controller = RetryController::new(resolver, RetryPolicy::default()).with_refresh(tx);
//!
//!     let source = controller
//!         .resolve_with_retries("dQw4w9WgXcQ", 5, DeviceProfileKind::Android)
//!         .await?;
//!     println!("{}", source.encoding.url);
//!     Ok(())
//! }
//! ```

mod error;
pub mod format;
pub mod nonce;
pub mod profile;
mod remote_config;
mod resolver;
mod retry;
mod types;

pub use error::{ResolverError, Result};
pub use format::{filter_formats, select_best_audio, FormatFilter};
pub use nonce::generate_nonce;
pub use profile::{DeviceProfile, DeviceProfileKind, ProfileStore};
pub use remote_config::{
    RefreshOutcome, RefreshRequest, RemoteConfigClient, RemoteConfigWorker,
    REFRESH_CHANNEL_CAPACITY,
};
pub use resolver::{SourceResolver, StreamResolver};
pub use retry::{RetryController, RetryPolicy};
pub use types::{
    Encoding, PlayerResponse, RemoteConfigDocument, ResolvedSource, ResolverConfig,
    DEFAULT_PLAYER_ENDPOINT, DEFAULT_REMOTE_CONFIG_URL,
};
