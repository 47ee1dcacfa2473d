//! Remote capability document
//!
//! A small JSON document published out of band can hot-patch the Android
//! profile (request payload and User-Agent) when upstream starts rejecting
//! the built-in one. Refreshes are requested by the retry controller over a
//! bounded channel and served by a single [`RemoteConfigWorker`].

use crate::error::{ResolverError, Result};
use crate::profile::ProfileStore;
use crate::types::{RemoteConfigDocument, ResolverConfig};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default capacity of the refresh request channel
pub const REFRESH_CHANNEL_CAPACITY: usize = 8;

/// Ask the worker to check the remote document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Content id whose resolution failed
    pub content_id: String,
    /// Attempt number that failed (1-based)
    pub attempt: u32,
}

/// What a refresh did to the profile store
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Nothing replaced
    Unchanged,

    /// The Android profile was replaced
    Rotated {
        version: f64,
        payload: bool,
        agent: bool,
    },
}

/// Fetches the capability document and applies it to the profile store.
#[derive(Debug, Clone)]
pub struct RemoteConfigClient {
    http: Client,
    url: String,
    profiles: Arc<ProfileStore>,
}

impl RemoteConfigClient {
    pub fn new(config: &ResolverConfig, profiles: Arc<ProfileStore>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ResolverError::Request)?;

        Ok(Self {
            http,
            url: config.remote_config_url.clone(),
            profiles,
        })
    }

    /// Download and parse the document
    pub async fn fetch(&self) -> Result<RemoteConfigDocument> {
        debug!(url = %self.url, "Fetching remote config");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ResolverError::RemoteConfig(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolverError::RemoteConfig(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        response
            .json::<RemoteConfigDocument>()
            .await
            .map_err(|e| ResolverError::RemoteConfig(format!("invalid document: {}", e)))
    }

    /// Apply the rotation rule for `doc` against the current store.
    ///
    /// Nothing changes when the version matches the known one. Otherwise the
    /// payload and agent are each taken when present and either a resolver
    /// failure was recorded or the document forces the update.
    pub fn apply(&self, doc: &RemoteConfigDocument) -> RefreshOutcome {
        let known = self.profiles.version();
        if doc.version == known {
            debug!(version = doc.version, "Remote config version unchanged");
            return RefreshOutcome::Unchanged;
        }

        let allowed = self.profiles.had_failure() || doc.force_update;
        let payload = doc.data.clone().filter(|_| allowed);
        let agent = doc.agent.clone().filter(|_| allowed);

        if payload.is_none() && agent.is_none() {
            debug!(
                known,
                remote = doc.version,
                "Remote config differs but nothing to apply"
            );
            return RefreshOutcome::Unchanged;
        }

        let outcome = RefreshOutcome::Rotated {
            version: doc.version,
            payload: payload.is_some(),
            agent: agent.is_some(),
        };
        self.profiles.rotate_android(payload, agent, doc.version);
        outcome
    }

    /// Fetch, apply, then clear the failure flag
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let doc = self.fetch().await?;
        let outcome = self.apply(&doc);
        self.profiles.clear_failure();
        Ok(outcome)
    }
}

/// Single consumer of refresh requests
#[derive(Debug)]
pub struct RemoteConfigWorker {
    client: RemoteConfigClient,
}

impl RemoteConfigWorker {
    pub fn new(client: RemoteConfigClient) -> Self {
        Self { client }
    }

    /// Bounded request channel sized for this worker
    pub fn channel(capacity: usize) -> (mpsc::Sender<RefreshRequest>, mpsc::Receiver<RefreshRequest>) {
        mpsc::channel(capacity.max(1))
    }

    /// Serve requests until every sender is dropped
    pub async fn run(self, mut rx: mpsc::Receiver<RefreshRequest>) {
        info!("Remote config worker started");

        while let Some(request) = rx.recv().await {
            debug!(
                content_id = %request.content_id,
                attempt = request.attempt,
                "Refresh requested"
            );

            match self.client.refresh().await {
                Ok(RefreshOutcome::Unchanged) => {}
                Ok(RefreshOutcome::Rotated { version, .. }) => {
                    info!(version, "Applied remote config");
                }
                Err(e) => warn!("Remote config refresh failed: {}", e),
            }
        }

        info!("Remote config worker stopped");
    }

    /// Run on the tokio runtime
    pub fn spawn(self, rx: mpsc::Receiver<RefreshRequest>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }
}
