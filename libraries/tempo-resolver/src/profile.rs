//! Device profiles
//!
//! A device profile is the client identity (name, version, platform fields
//! and User-Agent) the resolver presents to the upstream player endpoint.
//! Two built-in templates exist, iOS and Android. The Android template can
//! be hot-patched by the remote capability document; that happens through
//! [`ProfileStore`], which publishes whole new profile sets atomically so an
//! in-flight request always sees one consistent template.

use crate::nonce::{generate_nonce, CPN_LENGTH};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Config version the built-in templates correspond to
pub const LOCAL_CONFIG_VERSION: f64 = 1.0;

/// Which official client to impersonate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfileKind {
    /// iPhone app
    Ios,

    /// Android app
    #[default]
    Android,
}

impl DeviceProfileKind {
    /// Parse a profile name; anything unrecognised is Android
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "ios" => Self::Ios,
            _ => Self::Android,
        }
    }

    /// The other profile, used for fallback attempts
    pub fn fallback(self) -> Self {
        match self {
            Self::Ios => Self::Android,
            Self::Android => Self::Ios,
        }
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl FromStr for DeviceProfileKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DeviceProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `context.client` section of the player request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    pub client_name: String,
    pub client_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    pub platform: String,
    pub os_name: String,
    pub os_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_sdk_version: Option<String>,
    pub hl: String,
    pub gl: String,
    pub utc_offset_minutes: i32,
}

/// `context.request` section
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFlags {
    pub internal_experiment_flags: Vec<String>,
    pub use_ssl: bool,
}

/// `context.user` section
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFlags {
    pub locked_safety_mode: bool,
}

/// Full `context` object
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext<'a> {
    pub client: &'a ClientContext,
    pub request: RequestFlags,
    pub user: UserFlags,
}

/// Player request body built from a built-in template
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest<'a> {
    pub video_id: &'a str,
    pub cpn: String,
    pub content_check_ok: bool,
    pub racy_check_ok: bool,
    pub context: RequestContext<'a>,
}

/// Body sent to the player endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlayerRequestBody<'a> {
    /// Built from the profile's client fields
    Standard(PlayerRequest<'a>),

    /// Free-form payload delivered by remote config, with `videoId` and a
    /// fresh `cpn` merged in
    Override(Map<String, Value>),
}

impl PlayerRequestBody<'_> {
    /// The `cpn` nonce carried by this body
    pub fn cpn(&self) -> Option<&str> {
        match self {
            Self::Standard(request) => Some(request.cpn.as_str()),
            Self::Override(map) => map.get("cpn").and_then(Value::as_str),
        }
    }
}

/// Immutable client identity template
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub kind: DeviceProfileKind,
    pub client: ClientContext,
    pub user_agent: String,
    /// Replacement request payload installed by remote config
    pub payload_override: Option<Map<String, Value>>,
}

impl DeviceProfile {
    /// Built-in template for a profile kind
    pub fn for_kind(kind: DeviceProfileKind) -> Self {
        match kind {
            DeviceProfileKind::Ios => Self::ios(),
            DeviceProfileKind::Android => Self::android(),
        }
    }

    /// iPhone app template
    pub fn ios() -> Self {
        Self {
            kind: DeviceProfileKind::Ios,
            client: ClientContext {
                client_name: "IOS".into(),
                client_version: "19.228.1".into(),
                device_make: Some("Apple".into()),
                device_model: Some("iPhone16,2".into()),
                platform: "MOBILE".into(),
                os_name: "iOS".into(),
                os_version: "17.5.1.21F90".into(),
                android_sdk_version: None,
                hl: "en".into(),
                gl: "US".into(),
                utc_offset_minutes: -240,
            },
            user_agent: "com.google.ios.youtube/19.228.1(iPhone16,2; U; CPU iOS 17_5_1 like Mac OS X; en_US)".into(),
            payload_override: None,
        }
    }

    /// Android app template
    pub fn android() -> Self {
        Self {
            kind: DeviceProfileKind::Android,
            client: ClientContext {
                client_name: "ANDROID".into(),
                client_version: "19.30.36".into(),
                device_make: None,
                device_model: None,
                platform: "MOBILE".into(),
                os_name: "Android".into(),
                os_version: "14".into(),
                android_sdk_version: Some("34".into()),
                hl: "en".into(),
                gl: "US".into(),
                utc_offset_minutes: -240,
            },
            user_agent: "com.google.android.youtube/19.30.36 (Linux; U; Android 14; en_US) gzip"
                .into(),
            payload_override: None,
        }
    }

    /// Build the request body for `content_id` with a fresh nonce
    pub fn build_body<'a>(&'a self, content_id: &'a str) -> PlayerRequestBody<'a> {
        let cpn = generate_nonce(CPN_LENGTH);

        if let Some(payload) = &self.payload_override {
            let mut body = Map::new();
            body.insert("videoId".into(), Value::from(content_id));
            body.insert("cpn".into(), Value::from(cpn));
            for (key, value) in payload {
                body.insert(key.clone(), value.clone());
            }
            return PlayerRequestBody::Override(body);
        }

        PlayerRequestBody::Standard(PlayerRequest {
            video_id: content_id,
            cpn,
            content_check_ok: true,
            racy_check_ok: true,
            context: RequestContext {
                client: &self.client,
                request: RequestFlags {
                    internal_experiment_flags: Vec::new(),
                    use_ssl: true,
                },
                user: UserFlags {
                    locked_safety_mode: false,
                },
            },
        })
    }
}

/// One published generation of profiles
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub ios: Arc<DeviceProfile>,
    pub android: Arc<DeviceProfile>,
    /// Config version these profiles correspond to
    pub version: f64,
}

impl ProfileSet {
    fn builtin() -> Self {
        Self {
            ios: Arc::new(DeviceProfile::ios()),
            android: Arc::new(DeviceProfile::android()),
            version: LOCAL_CONFIG_VERSION,
        }
    }

    fn get(&self, kind: DeviceProfileKind) -> Arc<DeviceProfile> {
        match kind {
            DeviceProfileKind::Ios => Arc::clone(&self.ios),
            DeviceProfileKind::Android => Arc::clone(&self.android),
        }
    }
}

/// Shared, hot-swappable profile templates
///
/// Readers take snapshots; the remote config worker is the single writer
/// and replaces the whole set in one atomic store.
#[derive(Debug)]
pub struct ProfileStore {
    current: ArcSwap<ProfileSet>,
    failed: AtomicBool,
}

impl ProfileStore {
    /// Store holding the built-in templates
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ProfileSet::builtin()),
            failed: AtomicBool::new(false),
        }
    }

    /// Current template for `kind`
    pub fn snapshot(&self, kind: DeviceProfileKind) -> Arc<DeviceProfile> {
        self.current.load().get(kind)
    }

    /// Whole current set
    pub fn current(&self) -> Arc<ProfileSet> {
        self.current.load_full()
    }

    /// Locally known config version
    pub fn version(&self) -> f64 {
        self.current.load().version
    }

    /// Record a resolver-level failure; sticky until the next refresh
    pub fn mark_failure(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    /// Whether a resolver failure happened since the last refresh
    pub fn had_failure(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Clear the failure flag after a completed refresh
    pub fn clear_failure(&self) {
        self.failed.store(false, Ordering::SeqCst);
    }

    /// Publish a new Android template
    ///
    /// `None` keeps the current payload or agent.
    pub fn rotate_android(
        &self,
        payload_override: Option<Map<String, Value>>,
        user_agent: Option<String>,
        version: f64,
    ) {
        self.current.rcu(|set| {
            let mut android = DeviceProfile::clone(&set.android);
            if let Some(payload) = &payload_override {
                android.payload_override = Some(payload.clone());
            }
            if let Some(agent) = &user_agent {
                android.user_agent.clone_from(agent);
            }
            ProfileSet {
                ios: Arc::clone(&set.ios),
                android: Arc::new(android),
                version,
            }
        });

        info!(
            version,
            payload = payload_override.is_some(),
            agent = user_agent.is_some(),
            "Rotated android device profile"
        );
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}
