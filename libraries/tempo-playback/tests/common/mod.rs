//! Test doubles for the player engine and the resolver

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempo_core::Track;
use tempo_playback::{EngineError, PlaybackConfig, PlaybackSession, PlayerEngine};
use tempo_resolver::{
    DeviceProfileKind, Encoding, ResolvedSource, ResolverError, SourceResolver,
};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Load(String),
    Unload,
    Play,
    Pause,
    Seek(u64),
}

/// Engine that records every command
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_load: Mutex<bool>,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Load(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_loads(&self, fail: bool) {
        *self.fail_load.lock().unwrap() = fail;
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlayerEngine for FakeEngine {
    async fn load(&self, url: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Load(url.to_string()));
        if *self.fail_load.lock().unwrap() {
            return Err(EngineError::Load("unsupported media".into()));
        }
        Ok(())
    }

    async fn unload(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Unload);
        Ok(())
    }

    async fn play(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> Result<(), EngineError> {
        self.record(EngineCall::Seek(position_ms));
        Ok(())
    }
}

/// Resolver serving canned results, optionally held until released
#[derive(Default)]
pub struct FakeResolver {
    titles: Mutex<HashMap<String, String>>,
    unplayable: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Gate>>>,
}

/// Blocks resolutions until `release`
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl FakeResolver {
    pub fn with_title(self, id: &str, title: &str) -> Self {
        self.titles
            .lock()
            .unwrap()
            .insert(id.to_string(), title.to_string());
        self
    }

    pub fn unplayable(self, id: &str) -> Self {
        self.unplayable.lock().unwrap().push(id.to_string());
        self
    }

    /// Hold the next resolutions until the returned gate is released
    pub fn hold(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn open(&self) {
        *self.gate.lock().unwrap() = None;
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn stream_url(id: &str) -> String {
    format!("https://cdn.test/{id}")
}

#[async_trait]
impl SourceResolver for FakeResolver {
    async fn resolve(
        &self,
        content_id: &str,
        kind: DeviceProfileKind,
    ) -> tempo_resolver::Result<ResolvedSource> {
        self.requests.lock().unwrap().push(content_id.to_string());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.unplayable.lock().unwrap().iter().any(|id| id == content_id) {
            return Err(ResolverError::Exhausted {
                attempts: 5,
                last: Box::new(ResolverError::NoAudioFormat {
                    content_id: content_id.to_string(),
                }),
            });
        }

        let title = self.titles.lock().unwrap().get(content_id).cloned();
        Ok(ResolvedSource {
            encoding: Encoding {
                mime_type: "audio/mp4; codecs=\"mp4a.40.2\"".into(),
                codec: Some("mp4a.40.2".into()),
                bitrate: 128_000,
                url: stream_url(content_id),
                itag: Some(140),
                content_length: None,
                audio_sample_rate: Some(44_100),
                approx_duration_ms: Some(200_000),
                audio_quality: None,
            },
            title,
            author: Some("Upstream Channel".into()),
            length_seconds: Some(200),
            profile: kind,
        })
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter()
        .map(|id| Track::new(*id, format!("Hint {id}"), "Hint Channel"))
        .collect()
}

pub struct Harness {
    pub session: Arc<PlaybackSession>,
    pub engine: Arc<FakeEngine>,
    pub resolver: Arc<FakeResolver>,
}

pub fn harness(resolver: FakeResolver) -> Harness {
    let engine = Arc::new(FakeEngine::default());
    let resolver = Arc::new(resolver);
    let session = Arc::new(PlaybackSession::new(
        Arc::clone(&engine) as Arc<dyn PlayerEngine>,
        Arc::clone(&resolver) as Arc<dyn SourceResolver>,
        PlaybackConfig::default(),
    ));
    Harness {
        session,
        engine,
        resolver,
    }
}
