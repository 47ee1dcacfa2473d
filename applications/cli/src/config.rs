//! CLI configuration
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempo_playback::PlaybackConfig;
use tempo_resolver::{
    DeviceProfileKind, ResolverConfig, RetryPolicy, DEFAULT_PLAYER_ENDPOINT,
    DEFAULT_REMOTE_CONFIG_URL,
};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tempo.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_resolver")]
    pub resolver: ResolverSettings,

    #[serde(default = "default_retry")]
    pub retry: RetrySettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default = "default_player_endpoint")]
    pub player_endpoint: String,

    #[serde(default = "default_remote_config_url")]
    pub remote_config_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_profile_fallback")]
    pub profile_fallback: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_profile")]
    pub default_profile: String,

    #[serde(default = "default_status_buffer")]
    pub status_buffer: usize,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `tempo.toml` is read when
    /// present. Environment variables (`TEMPO_` prefix, `__` between
    /// section and key) override the file.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (e.g. TEMPO_RETRY__MAX_ATTEMPTS)
        settings = settings.add_source(
            config::Environment::with_prefix("TEMPO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.resolver_config().validate()?;

        if self.resolver.request_timeout_secs == 0 {
            anyhow::bail!("resolver.request_timeout_secs must be greater than zero");
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            anyhow::bail!("retry.max_backoff_ms must not be below retry.initial_backoff_ms");
        }

        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            player_endpoint: self.resolver.player_endpoint.clone(),
            remote_config_url: self.resolver.remote_config_url.clone(),
            request_timeout: Duration::from_secs(self.resolver.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.resolver.connect_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            profile_fallback: self.retry.profile_fallback,
        }
    }

    pub fn default_profile(&self) -> DeviceProfileKind {
        DeviceProfileKind::parse(&self.playback.default_profile)
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            default_profile: self.default_profile(),
            status_buffer: self.playback.status_buffer,
            event_buffer: self.playback.event_buffer,
            ..PlaybackConfig::default()
        }
    }
}

// Default values
fn default_resolver() -> ResolverSettings {
    ResolverSettings {
        player_endpoint: default_player_endpoint(),
        remote_config_url: default_remote_config_url(),
        request_timeout_secs: default_request_timeout_secs(),
        connect_timeout_secs: default_connect_timeout_secs(),
    }
}

fn default_player_endpoint() -> String {
    DEFAULT_PLAYER_ENDPOINT.to_string()
}

fn default_remote_config_url() -> String {
    DEFAULT_REMOTE_CONFIG_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_retry() -> RetrySettings {
    RetrySettings {
        max_attempts: default_max_attempts(),
        initial_backoff_ms: default_initial_backoff_ms(),
        max_backoff_ms: default_max_backoff_ms(),
        profile_fallback: default_profile_fallback(),
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    2000
}

fn default_profile_fallback() -> bool {
    true
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        default_profile: default_profile(),
        status_buffer: default_status_buffer(),
        event_buffer: default_event_buffer(),
    }
}

fn default_profile() -> String {
    "android".to_string()
}

fn default_status_buffer() -> usize {
    64
}

fn default_event_buffer() -> usize {
    128
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            resolver: default_resolver(),
            retry: default_retry(),
            playback: default_playback(),
            log_level: default_log_level(),
        }
    }
}
